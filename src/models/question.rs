use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 题目开始标记
pub const QUESTION_BEGIN: &str = "\\begin{question}";
/// 选项块开始标记
pub const OPTIONS_BEGIN: &str = "\\begin{oneparcheckboxes}";
/// 选项块结束标记
pub const OPTIONS_END: &str = "\\end{oneparcheckboxes}";
/// 普通选项标记
pub const CHOICE: &str = "\\choice";
/// 正确选项标记
pub const CORRECT_CHOICE: &str = "\\correctchoice";

/// 一道题目的 LaTeX 片段
///
/// `text` 以 `\begin{question}` 开头，分值标注 `[n]` 已被去掉；
/// 去掉之前读到的第一个分值保存在 `marks` 中。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBlock {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks: Option<u32>,
}

impl QuestionBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: None,
        }
    }

    pub fn with_marks(mut self, marks: u32) -> Self {
        self.marks = Some(marks);
        self
    }

    /// 是否包含选项块
    pub fn has_options(&self) -> bool {
        self.text.contains(OPTIONS_BEGIN)
    }
}

/// 题库：专题名 → 按源文件顺序排列的题目
///
/// 加载后只读，多个考生任务通过 `Arc` 共享。
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    topics: BTreeMap<String, Vec<QuestionBlock>>,
}

impl QuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_topic(&mut self, name: impl Into<String>, questions: Vec<QuestionBlock>) {
        self.topics.insert(name.into(), questions);
    }

    pub fn topic(&self, name: &str) -> Option<&[QuestionBlock]> {
        self.topics.get(name).map(Vec::as_slice)
    }

    pub fn topic_names(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    pub fn question_count(&self) -> usize {
        self.topics.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl FromIterator<(String, Vec<QuestionBlock>)> for QuestionBank {
    fn from_iter<I: IntoIterator<Item = (String, Vec<QuestionBlock>)>>(iter: I) -> Self {
        Self {
            topics: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_counts() {
        let bank: QuestionBank = vec![
            (
                "optics".to_string(),
                vec![
                    QuestionBlock::new("\\begin{question} a"),
                    QuestionBlock::new("\\begin{question} b"),
                ],
            ),
            ("waves".to_string(), vec![QuestionBlock::new("\\begin{question} c")]),
        ]
        .into_iter()
        .collect();

        assert_eq!(bank.topic_count(), 2);
        assert_eq!(bank.question_count(), 3);
        assert_eq!(bank.topic("optics").map(|q| q.len()), Some(2));
        assert!(bank.topic("missing").is_none());
        assert_eq!(bank.topic_names().collect::<Vec<_>>(), vec!["optics", "waves"]);
    }
}
