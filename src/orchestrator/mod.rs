//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量考生处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载试卷配置、题库、学号列表
//! - 控制并发数量（Semaphore）
//! - 持有外部工具（编译器、PDF 工具）
//! - 合并输出，输出全局统计信息
//!
//! ### `participant_processor` - 单个考生处理器
//! - 构建考生上下文
//! - 委托 PaperFlow 生成、写出、编译
//! - 输出单个考生的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<学号>)
//!     ↓
//! participant_processor (处理单个学号)
//!     ↓
//! workflow::PaperFlow (抽题 → 打乱 → 写出 → 编译)
//!     ↓
//! services (能力层：seed / selector / shuffler / builder / warn)
//!     ↓
//! infrastructure (基础设施：pdflatex / qpdf)
//! ```

pub mod batch_processor;
pub mod participant_processor;

// 重新导出主要类型
pub use batch_processor::{App, RunSummary};
pub use participant_processor::process_participant;
