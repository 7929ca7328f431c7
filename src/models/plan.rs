use serde::{Deserialize, Serialize};

/// 试卷标题信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizInfo {
    pub institute: String,
    pub department: String,
    pub course_code: String,
    pub quiz_title: String,
    /// 总分；不填时按抽到的题目分值求和
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_marks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_duration: Option<String>,
}

impl Default for QuizInfo {
    fn default() -> Self {
        Self {
            institute: String::new(),
            department: String::new(),
            course_code: String::new(),
            quiz_title: "QUIZ".to_string(),
            full_marks: None,
            time_duration: None,
        }
    }
}

/// 单个专题的抽题数量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicQuota {
    pub name: String,
    pub count: usize,
}

impl TopicQuota {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// 抽题计划
///
/// 专题顺序就是抽样顺序：同一个随机源按顺序为每个专题抽题，
/// 调整顺序会改变每个考生抽到的题目。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizPlan {
    quotas: Vec<TopicQuota>,
}

impl QuizPlan {
    pub fn new(quotas: Vec<TopicQuota>) -> Self {
        Self { quotas }
    }

    pub fn quotas(&self) -> &[TopicQuota] {
        &self.quotas
    }

    /// 计划中请求的题目总数（未按题库实际数量截断）
    pub fn requested(&self) -> usize {
        self.quotas.iter().map(|q| q.count).sum()
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for QuizPlan {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        Self {
            quotas: iter
                .into_iter()
                .map(|(name, count)| TopicQuota::new(name, count))
                .collect(),
        }
    }
}

/// quiz.toml 的完整内容
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizFile {
    #[serde(default)]
    pub info: QuizInfo,
    #[serde(default)]
    pub topics: QuizPlan,
    /// 额外的学号或学号范围，追加在学号文件之后
    #[serde(default)]
    pub rolls: Vec<String>,
}
