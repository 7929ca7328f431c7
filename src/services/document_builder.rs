//! 文档拼装服务 - 业务能力层
//!
//! 把已经处理好的题目包进完整的 LaTeX 文档（导言区引用、标题、页眉、questions 环境）。

use crate::models::plan::QuizInfo;

/// 文档类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// 发给考生的试卷（不含答案标记）
    Paper,
    /// 答案
    AnswerKey,
}

impl DocumentKind {
    /// 是否保留 `\correctchoice`
    pub fn preserve_correct(self) -> bool {
        matches!(self, DocumentKind::AnswerKey)
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Paper => "试卷",
            DocumentKind::AnswerKey => "答案",
        }
    }
}

/// 转义单个字符，避免学号中的 LaTeX 特殊字符破坏标题
fn escape_latex_char(c: char) -> String {
    match c {
        '\\' => "\\textbackslash{}".to_string(),
        '~' => "\\textasciitilde{}".to_string(),
        '^' => "\\textasciicircum{}".to_string(),
        '#' | '$' | '%' | '&' | '_' | '{' | '}' => format!("\\{}", c),
        _ => c.to_string(),
    }
}

/// 学号方格：每个字符一个 `\fsquare{c}`
pub fn roll_number_boxes(roll_number: &str) -> String {
    roll_number
        .chars()
        .map(|c| format!("\\fsquare{{{}}}", escape_latex_char(c)))
        .collect()
}

/// 标题块
pub fn build_title(roll_number: &str, info: &QuizInfo) -> String {
    format!(
        "\\title{{  \\large   Enrollment No. {} \\\\ \n        \\vspace{{1cm}} \\normalsize {} \\\\ \n        {} \\\\ {} \\\\ \n        {{\\vspace{{0.5 cm}} \\large \\bf{{{}}}}}}}",
        roll_number_boxes(roll_number),
        info.institute,
        info.department,
        info.course_code,
        info.quiz_title
    )
}

/// 拼装完整文档
///
/// # 参数
/// - `roll_number`: 学号（用于标题方格）
/// - `info`: 试卷标题信息
/// - `total_marks`: 总分（`info.full_marks` 优先）
/// - `questions`: 已经打乱选项的题目，按最终顺序排列
/// - `kind`: 试卷 / 答案，答案会加 `\printanswers`
pub fn build_document(
    roll_number: &str,
    info: &QuizInfo,
    total_marks: u32,
    questions: &[String],
    kind: DocumentKind,
) -> String {
    let mut content = vec![
        "\\input{preamble}".to_string(),
        String::new(),
        build_title(roll_number, info),
        format!("\\def\\fullmarks{{{}}}", info.full_marks.unwrap_or(total_marks)),
    ];

    if let Some(duration) = &info.time_duration {
        content.push(format!("\\def\\timeduration{{{}}}", duration));
    }
    if kind == DocumentKind::AnswerKey {
        content.push("\\printanswers".to_string());
    }

    content.extend(
        [
            "\\begin{document}",
            "\\maketitle",
            "\\examheader",
            "\\begin{questions}",
        ]
        .map(String::from),
    );
    content.extend(questions.iter().cloned());
    content.push("\\end{questions}".to_string());
    content.push("\\end{document}".to_string());

    content.join("\n")
}

/// 单页空白文档，用于合并时补齐奇数页
pub fn blank_page_document() -> String {
    [
        "\\documentclass{article}",
        "\\pagestyle{empty}",
        "\\begin{document}",
        "\\mbox{}",
        "\\end{document}",
    ]
    .join("\n")
}
