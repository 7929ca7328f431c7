//! 基础设施层
//!
//! 持有外部程序（LaTeX 编译器、PDF 工具），只暴露能力，不认识考生和题目。

pub mod latex;
pub mod pdf_merge;

pub use latex::{DocumentCompiler, PdfLatexCompiler};
pub use pdf_merge::{collect_inputs, merge_documents, MergeOutcome, PdfTool, QpdfTool};

use std::path::PathBuf;

/// 外部文档工具错误
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("编译失败 ({}):\n{}", path.display(), diagnostics)]
    Compile { path: PathBuf, diagnostics: String },

    #[error("无法运行 {program}: {source}")]
    ToolUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("合并失败 ({output}): {diagnostics}")]
    Merge { output: String, diagnostics: String },

    #[error("无法读取页数 ({}): {}", path.display(), output)]
    PageCount { path: PathBuf, output: String },

    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}
