//! # texmcq
//!
//! 为每个考生生成一份个性化的 LaTeX 选择题试卷和对应答案
//!
//! 同一个学号每次运行得到完全相同的试卷：抽题、题目顺序、选项顺序都由学号派生的种子决定。
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部程序，只暴露能力
//! - `DocumentCompiler` - 把 .tex 编译成 PDF（pdflatex）
//! - `PdfTool` - 读取页数、拼接 PDF（qpdf）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不认识考生列表
//! - `seed` - 学号 → 主种子
//! - `question_selector` - 按专题抽题并打乱
//! - `option_shuffler` - 打乱单道题的选项
//! - `document_builder` - 拼装完整文档
//! - `WarnWriter` - 写 warn.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个考生"的完整处理流程
//! - `ParticipantCtx` - 上下文封装（学号 + 序号 + 主种子）
//! - `PaperFlow` - 流程编排（抽题 → 打乱 → 写出 → 编译 → warn）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量考生处理器，管理资源、并发和合并
//! - `orchestrator/participant_processor` - 单个考生处理器
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{DocumentCompiler, DocumentError, PdfTool};
pub use models::{QuestionBank, QuestionBlock, QuizInfo, QuizPlan};
pub use orchestrator::{process_participant, App, RunSummary};
pub use workflow::{PaperFlow, ParticipantCtx, ProcessResult, QuizContext};
