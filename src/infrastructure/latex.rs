//! LaTeX 编译器 - 基础设施层
//!
//! 持有外部编译程序，只暴露"把 .tex 编译成 PDF"的能力

use crate::infrastructure::DocumentError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// 编译失败时保留的输出行数
const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// 编译后删除的辅助文件扩展名
const AUX_EXTENSIONS: [&str; 3] = ["aux", "log", "out"];

/// 文档编译能力
///
/// 职责：
/// - 把一个 .tex 文件编译成 PDF，返回 PDF 路径
/// - 失败时带上编译器自己的诊断输出
/// - 不认识考生 / 题目
#[async_trait]
pub trait DocumentCompiler: Send + Sync {
    async fn compile(&self, tex_path: &Path) -> Result<PathBuf, DocumentError>;
}

/// 调用 pdflatex 的编译器
#[derive(Debug, Clone)]
pub struct PdfLatexCompiler {
    program: String,
    passes: usize,
}

impl PdfLatexCompiler {
    /// 创建编译器
    ///
    /// # 参数
    /// - `program`: 编译程序（通常是 `pdflatex`）
    /// - `passes`: 编译次数，第二次用于稳定交叉引用
    pub fn new(program: impl Into<String>, passes: usize) -> Self {
        Self {
            program: program.into(),
            passes: passes.max(1),
        }
    }

    async fn run_once(&self, work_dir: &Path, file_name: &str) -> Result<(), DocumentError> {
        let output = Command::new(&self.program)
            .arg("-interaction=nonstopmode")
            .arg(file_name)
            .current_dir(work_dir)
            .output()
            .await
            .map_err(|source| DocumentError::ToolUnavailable {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(DocumentError::Compile {
            path: work_dir.join(file_name),
            diagnostics: collect_diagnostics(&stdout, &stderr),
        })
    }
}

#[async_trait]
impl DocumentCompiler for PdfLatexCompiler {
    async fn compile(&self, tex_path: &Path) -> Result<PathBuf, DocumentError> {
        let work_dir = match tex_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = tex_path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| DocumentError::Compile {
                path: tex_path.to_path_buf(),
                diagnostics: "无效的文件名".to_string(),
            })?;

        for pass in 1..=self.passes {
            debug!("编译 {} (第 {}/{} 次)", tex_path.display(), pass, self.passes);
            self.run_once(&work_dir, file_name).await?;
        }

        remove_aux_files(tex_path).await;
        Ok(tex_path.with_extension("pdf"))
    }
}

/// 提取编译器诊断信息
///
/// pdflatex 把错误写在 stdout，以 `!` 开头的行就是错误；
/// 找不到时保留输出的最后若干行。
pub fn collect_diagnostics(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().collect();

    let errors: Vec<String> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.starts_with('!'))
        .map(|(i, _)| lines[i..lines.len().min(i + 3)].join("\n"))
        .collect();

    let mut diagnostics = if errors.is_empty() {
        let start = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
        lines[start..].join("\n")
    } else {
        errors.join("\n")
    };

    let stderr = stderr.trim();
    if !stderr.is_empty() {
        if !diagnostics.is_empty() {
            diagnostics.push('\n');
        }
        diagnostics.push_str(stderr);
    }
    diagnostics
}

/// 删除编译产生的辅助文件
async fn remove_aux_files(tex_path: &Path) {
    for ext in AUX_EXTENSIONS {
        let path = tex_path.with_extension(ext);
        if tokio::fs::remove_file(&path).await.is_ok() {
            debug!("已删除辅助文件: {}", path.display());
        }
    }
}
