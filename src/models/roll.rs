//! 学号列表与学号范围展开

use crate::error::{AppError, AppResult, ConfigError};
use regex::Regex;
use std::collections::HashSet;

const RANGE_PATTERN: &str = r"^(.*?)(\d+)\.\.\.(\d+)$";

/// 展开学号范围
///
/// `PREFIX<N>...<M>` 展开为 `PREFIX<N>, PREFIX<N+1>, …, PREFIX<M>`，
/// 数字部分按 `<N>` 的位数补零。`<M>` 比 `<N>` 短时只替换 `<N>` 末尾的几位，
/// 例如 `2024001...050` 的终点是 `2024050`。不是范围写法的输入原样返回。
pub fn expand_roll_pattern(pattern: &str) -> AppResult<Vec<String>> {
    let pattern = pattern.trim();
    let re = Regex::new(RANGE_PATTERN).map_err(|e| AppError::Other(e.to_string()))?;
    let Some(caps) = re.captures(pattern) else {
        return Ok(vec![pattern.to_string()]);
    };

    let prefix = &caps[1];
    let start_digits = &caps[2];
    let width = start_digits.len();

    let parse = |digits: &str| {
        digits
            .parse::<u64>()
            .map_err(|_| ConfigError::RollRangeParseFailed {
                pattern: pattern.to_string(),
            })
    };
    let start = parse(start_digits)?;
    let end_digits = &caps[3];
    let end = if end_digits.len() < width {
        let kept = &start_digits[..width - end_digits.len()];
        parse(&format!("{}{}", kept, end_digits))?
    } else {
        parse(end_digits)?
    };

    if end < start {
        return Err(ConfigError::InvalidRollRange {
            pattern: pattern.to_string(),
        }
        .into());
    }

    Ok((start..=end)
        .map(|n| format!("{}{:0width$}", prefix, n, width = width))
        .collect())
}

/// 解析学号列表文本
///
/// 每行一个学号或学号范围；空行和 `#` 开头的注释行被忽略，重复学号只保留第一次出现。
pub fn parse_roll_numbers(text: &str) -> AppResult<Vec<String>> {
    collect_roll_numbers(text.lines())
}

/// 按顺序展开多条学号 / 学号范围，去除重复
pub fn collect_roll_numbers<'a, I>(entries: I) -> AppResult<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut rolls = Vec::new();

    for entry in entries {
        let entry = entry.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        for roll in expand_roll_pattern(entry)? {
            if seen.insert(roll.clone()) {
                rolls.push(roll);
            }
        }
    }

    Ok(rolls)
}
