//! 选项打乱服务 - 业务能力层
//!
//! 只处理单道题目：找到 `oneparcheckboxes` 选项块，用给定种子打乱选项，
//! 再按需要抹掉 `\correctchoice` 标记。

use crate::models::question::{CHOICE, CORRECT_CHOICE, OPTIONS_BEGIN, OPTIONS_END};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// 选项块在题目文本中的位置（字节偏移）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OptionsSpan {
    /// 选项块内容起点（开始标记之后）
    inner_start: usize,
    /// 选项块内容终点（结束标记之前）
    inner_end: usize,
}

/// 定位第一个选项块
///
/// 从开始标记往后扫描，跟踪花括号深度和嵌套的选项块，
/// 只有在深度为 0 时遇到的结束标记才算数。`%` 注释中的内容不参与计数。
/// `\verb|{|`、`\url{a%20b}` 这类写法会让计数失衡，此时退回到开始标记之后的
/// 第一个结束标记。完全没有结束标记时返回 `None`。
fn find_options_span(text: &str) -> Option<OptionsSpan> {
    let begin = text.find(OPTIONS_BEGIN)?;
    let inner_start = begin + OPTIONS_BEGIN.len();

    let inner_end = scan_balanced_end(text, inner_start)
        .or_else(|| text[inner_start..].find(OPTIONS_END).map(|o| inner_start + o))?;

    Some(OptionsSpan {
        inner_start,
        inner_end,
    })
}

/// 从 `start` 开始按花括号深度寻找结束标记，找不到时返回 `None`
fn scan_balanced_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth: usize = 0;
    let mut nested: usize = 0;
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                let rest = &text[i..];
                if rest.starts_with(OPTIONS_END) && depth == 0 {
                    if nested == 0 {
                        return Some(i);
                    }
                    nested -= 1;
                    i += OPTIONS_END.len();
                } else if rest.starts_with(OPTIONS_BEGIN) && depth == 0 {
                    nested += 1;
                    i += OPTIONS_BEGIN.len();
                } else {
                    // 转义字符（\{ \} \% \\）整体跳过
                    i += 2;
                }
            }
            b'%' => match text[i..].find('\n') {
                Some(offset) => i += offset,
                None => return None,
            },
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            _ => i += 1,
        }
    }

    None
}

fn is_marker_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with(CHOICE) || trimmed.starts_with(CORRECT_CHOICE)
}

/// 拆分选项块内容
///
/// 以 `\choice` / `\correctchoice` 开头的行开始一个新选项，之后的行（包括空行）
/// 都属于当前选项。第一个选项之前的行作为引导部分原样保留，不参与打乱。
fn split_entries(inner: &str) -> (Vec<&str>, Vec<String>) {
    let mut lead_in = Vec::new();
    let mut entries: Vec<String> = Vec::new();

    for line in inner.split('\n') {
        if is_marker_line(line) {
            entries.push(line.to_string());
        } else if let Some(current) = entries.last_mut() {
            current.push('\n');
            current.push_str(line);
        } else {
            lead_in.push(line);
        }
    }

    (lead_in, entries)
}

/// 返回题目中第一个选项块的选项（原始顺序，含标记）
///
/// 没有选项块时返回空列表。
pub fn option_entries(question: &str) -> Vec<String> {
    match find_options_span(question) {
        Some(span) => split_entries(question[span.inner_start..span.inner_end].trim_end()).1,
        None => Vec::new(),
    }
}

/// 打乱一道题的选项
///
/// # 参数
/// - `question`: 题目 LaTeX 片段
/// - `seed`: 选项种子（每次调用都重新播种，不依赖任何外部随机状态）
/// - `preserve_correct`: `true` 时保留 `\correctchoice`（答案），
///   `false` 时全部改成 `\choice`（试卷）
///
/// # 返回
/// 只替换选项块内部，其余文本和开始/结束标记原样保留。
/// 同样的 `(question, seed)` 无论 `preserve_correct` 取值，选项顺序都相同。
pub fn randomize_options(question: &str, seed: u64, preserve_correct: bool) -> String {
    let shuffled = shuffle_options(question, seed);
    if preserve_correct {
        shuffled
    } else {
        // 试卷里不允许残留任何正确选项标记，包括没能定位选项块的题目
        shuffled.replace(CORRECT_CHOICE, CHOICE)
    }
}

/// 打乱第一个选项块中的选项，保留所有标记
fn shuffle_options(question: &str, seed: u64) -> String {
    let Some(span) = find_options_span(question) else {
        return question.to_string();
    };

    // 结束标记前的空白留在原处，不跟着最后一个选项移动
    let inner = &question[span.inner_start..span.inner_end];
    let content = inner.trim_end();
    let tail = &inner[content.len()..];

    let (lead_in, mut entries) = split_entries(content);
    if entries.is_empty() {
        return question.to_string();
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    entries.shuffle(&mut rng);

    let body = lead_in
        .iter()
        .map(|line| line.to_string())
        .chain(entries)
        .collect::<Vec<_>>()
        .join("\n");

    let mut out = String::with_capacity(question.len() + 16);
    out.push_str(&question[..span.inner_start]);
    out.push_str(&body);
    out.push_str(tail);
    out.push_str(&question[span.inner_end..]);
    out
}
