//! PDF 合并 - 基础设施层
//!
//! 把每个考生的 PDF 按文件名顺序拼成一个文件，奇数页的文档后面补一页空白，
//! 保证每份文档都从奇数页开始（方便双面打印）。

use crate::infrastructure::DocumentError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tracing::{info, warn};

/// PDF 工具能力：数页数、顺序拼接
#[async_trait]
pub trait PdfTool: Send + Sync {
    async fn page_count(&self, pdf: &Path) -> Result<usize, DocumentError>;

    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), DocumentError>;
}

/// 基于 qpdf 命令行的实现
#[derive(Debug, Clone)]
pub struct QpdfTool {
    program: String,
}

impl QpdfTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: Vec<String>) -> Result<String, DocumentError> {
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|source| DocumentError::ToolUnavailable {
                program: self.program.clone(),
                source,
            })?;

        // qpdf 退出码 3 表示成功但有警告
        match output.status.code() {
            Some(0) | Some(3) => Ok(String::from_utf8_lossy(&output.stdout).into_owned()),
            _ => Err(DocumentError::Merge {
                output: args.last().cloned().unwrap_or_default(),
                diagnostics: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}

#[async_trait]
impl PdfTool for QpdfTool {
    async fn page_count(&self, pdf: &Path) -> Result<usize, DocumentError> {
        let stdout = self
            .run(vec!["--show-npages".to_string(), pdf.display().to_string()])
            .await?;
        stdout
            .trim()
            .parse::<usize>()
            .map_err(|_| DocumentError::PageCount {
                path: pdf.to_path_buf(),
                output: stdout.trim().to_string(),
            })
    }

    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), DocumentError> {
        let mut args = vec!["--empty".to_string(), "--pages".to_string()];
        args.extend(inputs.iter().map(|p| p.display().to_string()));
        args.push("--".to_string());
        args.push(output.display().to_string());
        self.run(args).await.map(|_| ())
    }
}

/// 合并结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// 没有符合条件的输入，没有生成文件
    NoInputs,
    /// 合并完成
    Merged {
        documents: usize,
        padded: usize,
    },
}

/// 生成拼接顺序：奇数页的文档后面插入空白页
///
/// 没有空白页可用时不补页。
pub fn plan_merge(inputs: &[(PathBuf, usize)], blank_page: Option<&Path>) -> Vec<PathBuf> {
    let mut plan = Vec::with_capacity(inputs.len() * 2);
    for (path, pages) in inputs {
        plan.push(path.clone());
        if pages % 2 != 0 {
            if let Some(blank) = blank_page {
                plan.push(blank.to_path_buf());
            }
        }
    }
    plan
}

/// 列出目录中以 `prefix` 开头的 PDF，按文件名排序
pub async fn collect_inputs(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, DocumentError> {
    let mut inputs = Vec::new();
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_pdf = path.extension().and_then(|s| s.to_str()) == Some("pdf");
        let matches_prefix = path
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|name| name.starts_with(prefix));
        if is_pdf && matches_prefix {
            inputs.push(path);
        }
    }

    inputs.sort();
    Ok(inputs)
}

/// 合并多个 PDF
///
/// # 参数
/// - `tool`: PDF 工具
/// - `inputs`: 按顺序排列的输入文件
/// - `output`: 输出文件
/// - `blank_page`: 单页空白 PDF，用于补齐奇数页
pub async fn merge_documents(
    tool: &dyn PdfTool,
    inputs: &[PathBuf],
    output: &Path,
    blank_page: Option<&Path>,
) -> Result<MergeOutcome, DocumentError> {
    if inputs.is_empty() {
        warn!("⚠️ 没有可合并的文件，跳过 {}", output.display());
        return Ok(MergeOutcome::NoInputs);
    }

    let mut counted = Vec::with_capacity(inputs.len());
    for input in inputs {
        let pages = tool.page_count(input).await?;
        counted.push((input.clone(), pages));
    }

    let padded = counted.iter().filter(|(_, pages)| pages % 2 != 0).count();
    if padded > 0 && blank_page.is_none() {
        warn!("⚠️ 没有空白页可用，{} 个奇数页文档不补页", padded);
    }

    let plan = plan_merge(&counted, blank_page);
    tool.concat(&plan, output).await?;

    info!(
        "✓ 已合并 {} 个文件 → {}",
        inputs.len(),
        output.display()
    );

    Ok(MergeOutcome::Merged {
        documents: inputs.len(),
        padded: if blank_page.is_some() { padded } else { 0 },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// 记录调用的假 PDF 工具
    #[derive(Default)]
    struct FakePdfTool {
        pages: HashMap<PathBuf, usize>,
        concatenated: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl PdfTool for FakePdfTool {
        async fn page_count(&self, pdf: &Path) -> Result<usize, DocumentError> {
            Ok(self.pages.get(pdf).copied().unwrap_or(1))
        }

        async fn concat(&self, inputs: &[PathBuf], _output: &Path) -> Result<(), DocumentError> {
            *self.concatenated.lock().unwrap() = inputs.to_vec();
            Ok(())
        }
    }

    #[test]
    fn test_plan_merge_pads_odd_documents() {
        let blank = PathBuf::from("blank.pdf");
        let inputs = vec![
            (PathBuf::from("a.pdf"), 1),
            (PathBuf::from("b.pdf"), 2),
            (PathBuf::from("c.pdf"), 3),
        ];
        let plan = plan_merge(&inputs, Some(&blank));
        let names: Vec<_> = plan.iter().map(|p| p.to_str().unwrap()).collect();
        assert_eq!(names, vec!["a.pdf", "blank.pdf", "b.pdf", "c.pdf", "blank.pdf"]);
    }

    #[test]
    fn test_plan_merge_without_blank_page() {
        let inputs = vec![(PathBuf::from("a.pdf"), 1)];
        assert_eq!(plan_merge(&inputs, None), vec![PathBuf::from("a.pdf")]);
    }

    #[tokio::test]
    async fn test_merge_with_no_inputs() {
        let tool = FakePdfTool::default();
        let outcome = merge_documents(&tool, &[], Path::new("out.pdf"), None)
            .await
            .unwrap();
        assert_eq!(outcome, MergeOutcome::NoInputs);
        assert!(tool.concatenated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_merge_pads_through_tool() {
        let mut tool = FakePdfTool::default();
        tool.pages.insert(PathBuf::from("quiz_A1.pdf"), 2);
        tool.pages.insert(PathBuf::from("quiz_A2.pdf"), 3);
        let blank = PathBuf::from("blank.pdf");

        let inputs = vec![PathBuf::from("quiz_A1.pdf"), PathBuf::from("quiz_A2.pdf")];
        let outcome = merge_documents(&tool, &inputs, Path::new("all.pdf"), Some(&blank))
            .await
            .unwrap();

        assert_eq!(outcome, MergeOutcome::Merged { documents: 2, padded: 1 });
        assert_eq!(
            *tool.concatenated.lock().unwrap(),
            vec![
                PathBuf::from("quiz_A1.pdf"),
                PathBuf::from("quiz_A2.pdf"),
                PathBuf::from("blank.pdf")
            ]
        );
    }

    #[tokio::test]
    async fn test_collect_inputs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["quiz_B.pdf", "quiz_A.pdf", "quiz_A.tex", "other.pdf"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let inputs = collect_inputs(dir.path(), "quiz_").await.unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["quiz_A.pdf", "quiz_B.pdf"]);
    }
}
