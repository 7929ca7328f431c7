//! 考生处理上下文
//!
//! 封装"我正在处理第几个考生、学号是什么、主种子是多少"这一信息

use crate::services::derive_seed;
use std::fmt::Display;

/// 考生处理上下文
#[derive(Debug, Clone)]
pub struct ParticipantCtx {
    /// 学号
    pub roll_number: String,

    /// 考生序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 考生总数（仅用于日志显示）
    pub total: usize,

    /// 由学号派生的主种子
    pub main_seed: u64,
}

impl ParticipantCtx {
    /// 创建新的考生上下文
    pub fn new(roll_number: impl Into<String>, index: usize, total: usize) -> Self {
        let roll_number = roll_number.into();
        let main_seed = derive_seed(&roll_number);
        Self {
            roll_number,
            index,
            total,
            main_seed,
        }
    }

    /// 输出文件名主干
    pub fn file_stem(&self) -> String {
        file_stem_for(&self.roll_number)
    }
}

/// 学号对应的输出文件名主干：`quiz_<学号>`，路径分隔符替换为下划线
///
/// 不同学号可能得到同一个主干（`A/1` 和 `A_1`），调用方需要检查冲突。
pub fn file_stem_for(roll_number: &str) -> String {
    let safe: String = roll_number
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("quiz_{}", safe)
}

impl Display for ParticipantCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[考生 {}/{} {}]", self.index, self.total, self.roll_number)
    }
}
