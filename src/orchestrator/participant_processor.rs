//! 单个考生处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理单个考生，是考生级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **构建上下文**：学号 → 主种子
//! 2. **流程调度**：委托 `PaperFlow` 生成、写出、编译
//! 3. **统计输出**：记录该考生的结果

use crate::workflow::{PaperFlow, ParticipantCtx, ParticipantReport, ProcessResult, QuizContext};
use anyhow::Result;
use tracing::{info, warn};

/// 处理单个考生
///
/// # 参数
/// - `flow`: 试卷生成流程（所有考生共享）
/// - `quiz`: 题库、抽题计划和标题信息（只读共享）
/// - `roll_number`: 学号
/// - `index`: 考生序号（从1开始，用于日志）
/// - `total`: 考生总数
///
/// # 返回
/// 返回该考生的处理报告；写文件失败等错误向上传递，编译失败记录在报告中
pub async fn process_participant(
    flow: &PaperFlow,
    quiz: &QuizContext,
    roll_number: &str,
    index: usize,
    total: usize,
) -> Result<ParticipantReport> {
    let ctx = ParticipantCtx::new(roll_number, index, total);
    log_participant_start(&ctx);

    let report = flow.run(&ctx, quiz).await?;

    log_participant_complete(&ctx, &report);
    Ok(report)
}

// ========== 日志辅助函数 ==========

fn log_participant_start(ctx: &ParticipantCtx) {
    info!("\n{} {}", ctx, "─".repeat(30));
    info!("{} 开始生成", ctx);
}

fn log_participant_complete(ctx: &ParticipantCtx, report: &ParticipantReport) {
    match &report.result {
        ProcessResult::Skipped { stage, .. } => {
            warn!("{} ⚠️ {}失败，已跳过", ctx, stage);
        }
        _ => {
            info!(
                "{} ✅ 处理完成: {} 道题目, 总分 {}",
                ctx, report.question_count, report.total_marks
            );
        }
    }
}
