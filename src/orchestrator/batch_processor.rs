//! 批量考生处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责所有考生的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、试卷配置、题库、学号列表、外部工具
//! 2. **并发控制**：使用 Semaphore 限制同时处理的考生数量
//! 3. **进度输出**：每完成一个考生输出一次百分比
//! 4. **合并输出**：所有考生完成后合并试卷和答案 PDF
//! 5. **全局统计**：汇总所有考生的处理结果，写出 manifest.json
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个考生的细节
//! - **资源所有者**：唯一持有编译器和 PDF 工具的模块
//! - **并发安全**：每个考生的随机源由种子独立创建，任务之间没有共享的可变状态

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};
use crate::infrastructure::{
    collect_inputs, merge_documents, DocumentCompiler, MergeOutcome, PdfLatexCompiler, PdfTool,
    QpdfTool,
};
use crate::models::{load_question_bank, load_quiz_file, load_roll_numbers};
use crate::orchestrator::participant_processor;
use crate::services::document_builder::blank_page_document;
use crate::services::WarnWriter;
use crate::utils::logging;
use crate::workflow::{file_stem_for, PaperFlow, ParticipantReport, ProcessResult, QuizContext};
use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 输出文件名前缀
const OUTPUT_PREFIX: &str = "quiz_";
/// 运行清单文件名（写在试卷目录中）
const MANIFEST_FILE: &str = "manifest.json";
/// 警告文件名（写在试卷目录中）
const WARN_FILE: &str = "warn.txt";

/// 应用主结构
pub struct App {
    config: Config,
    quiz: Arc<QuizContext>,
    roll_numbers: Vec<String>,
    compiler: Option<Arc<dyn DocumentCompiler>>,
    pdf_tool: Option<Arc<dyn PdfTool>>,
}

/// 运行统计
#[derive(Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub reports: Vec<ParticipantReport>,
}

impl App {
    /// 初始化应用
    ///
    /// 试卷配置、题库、学号任何一个加载失败都会终止运行。
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(config.max_concurrent_jobs, config.skip_compile);

        info!("\n📁 正在加载试卷配置...");
        let quiz_file = load_quiz_file(Path::new(&config.quiz_file)).await?;

        info!("📚 正在加载题库...");
        let bank = load_question_bank(&config.topics_dir)
            .await
            .context("题库加载失败")?;

        let roll_numbers =
            load_roll_numbers(Path::new(&config.roll_numbers_file), &quiz_file.rolls).await?;

        let (compiler, pdf_tool): (Option<Arc<dyn DocumentCompiler>>, Option<Arc<dyn PdfTool>>) =
            if config.skip_compile {
                (None, None)
            } else {
                (
                    Some(Arc::new(PdfLatexCompiler::new(
                        config.latex_program.clone(),
                        config.latex_passes,
                    ))),
                    Some(Arc::new(QpdfTool::new(config.qpdf_program.clone()))),
                )
            };

        let quiz = QuizContext {
            plan: quiz_file.topics,
            bank,
            info: quiz_file.info,
        };

        Self::from_parts(config, quiz, roll_numbers, compiler, pdf_tool)
    }

    /// 用已经准备好的数据和外部工具组装应用
    pub fn from_parts(
        config: Config,
        quiz: QuizContext,
        roll_numbers: Vec<String>,
        compiler: Option<Arc<dyn DocumentCompiler>>,
        pdf_tool: Option<Arc<dyn PdfTool>>,
    ) -> Result<Self> {
        if roll_numbers.is_empty() {
            return Err(ConfigError::NoRollNumbers.into());
        }
        check_file_stems(&roll_numbers)?;

        Ok(Self {
            config,
            quiz: Arc::new(quiz),
            roll_numbers,
            compiler,
            pdf_tool,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunSummary> {
        self.prepare_output_dirs().await?;

        logging::log_bank_loaded(
            self.quiz.bank.topic_count(),
            self.quiz.bank.question_count(),
            self.roll_numbers.len(),
        );
        self.warn_unknown_topics();

        let summary = self.process_all_participants().await?;
        self.write_manifest(&summary.reports).await?;

        if let (Some(compiler), Some(pdf_tool)) = (&self.compiler, &self.pdf_tool) {
            self.merge_outputs(compiler.as_ref(), pdf_tool.as_ref()).await;
        }

        logging::print_final_stats(
            summary.success,
            summary.failed,
            summary.total,
            &self.config.output_log_file,
        );

        Ok(summary)
    }

    /// 创建输出目录，把导言区模板复制到试卷和答案目录
    async fn prepare_output_dirs(&self) -> Result<()> {
        let preamble = Path::new(&self.config.preamble_file);

        for dir in [&self.config.papers_dir, &self.config.answers_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("无法创建输出目录: {}", dir))?;

            if preamble.exists() {
                let dest = Path::new(dir).join("preamble.tex");
                tokio::fs::copy(preamble, &dest)
                    .await
                    .with_context(|| format!("无法复制导言区到: {}", dest.display()))?;
            } else if self.compiler.is_some() {
                warn!("⚠️ 导言区文件不存在: {}，编译可能失败", preamble.display());
            }
        }

        Ok(())
    }

    fn warn_unknown_topics(&self) {
        for quota in self.quiz.plan.quotas() {
            if self.quiz.bank.topic(&quota.name).is_none() {
                warn!("⚠️ 专题 {} 不在题库中，将不贡献题目", quota.name);
            }
        }
    }

    /// 处理所有考生
    async fn process_all_participants(&self) -> Result<RunSummary> {
        let warn_writer = Arc::new(WarnWriter::with_path(
            Path::new(&self.config.papers_dir).join(WARN_FILE),
        ));
        let flow = Arc::new(
            PaperFlow::new(
                self.compiler.clone(),
                warn_writer,
                &self.config.papers_dir,
                &self.config.answers_dir,
            )
            .with_verbose_logging(self.config.verbose_logging),
        );
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_jobs));
        let total = self.roll_numbers.len();

        let mut handles = FuturesUnordered::new();
        for (idx, roll_number) in self.roll_numbers.iter().enumerate() {
            let semaphore = semaphore.clone();
            let flow = flow.clone();
            let quiz = self.quiz.clone();
            let roll_number = roll_number.clone();

            handles.push(tokio::spawn(async move {
                let result: Result<ParticipantReport> = async {
                    let _permit = semaphore.acquire_owned().await?;
                    participant_processor::process_participant(
                        &flow,
                        &quiz,
                        &roll_number,
                        idx + 1,
                        total,
                    )
                    .await
                }
                .await;
                (roll_number, result)
            }));
        }

        let mut summary = RunSummary {
            total,
            ..Default::default()
        };
        let mut done = 0;

        while let Some(joined) = handles.next().await {
            done += 1;
            match joined {
                Ok((_, Ok(report))) => {
                    if matches!(report.result, ProcessResult::Skipped { .. }) {
                        summary.failed += 1;
                    } else {
                        summary.success += 1;
                    }
                    summary.reports.push(report);
                }
                Ok((roll_number, Err(e))) => {
                    error!("[考生 {}] ❌ 处理过程中发生错误: {:#}", roll_number, e);
                    summary.failed += 1;
                }
                Err(e) => {
                    error!("考生任务执行失败: {}", e);
                    summary.failed += 1;
                }
            }
            logging::log_progress(done, total);
        }

        // 完成顺序不固定，清单按学号列表顺序输出
        summary.reports.sort_by_key(|r| {
            self.roll_numbers
                .iter()
                .position(|roll| roll == &r.roll_number)
                .unwrap_or(usize::MAX)
        });

        Ok(summary)
    }

    /// 写出运行清单
    async fn write_manifest(&self, reports: &[ParticipantReport]) -> Result<()> {
        let path = Path::new(&self.config.papers_dir).join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(reports)
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        info!("📝 运行清单已写入: {}", path.display());
        Ok(())
    }

    /// 合并试卷和答案
    ///
    /// 合并失败只记录日志，不影响已经生成的单个文件。
    async fn merge_outputs(&self, compiler: &dyn DocumentCompiler, pdf_tool: &dyn PdfTool) {
        info!("\n📎 正在合并试卷和答案...");

        // 每次运行一个独立的临时目录，离开作用域时自动删除
        let scratch = match tempfile::Builder::new()
            .prefix(".blank_page")
            .tempdir_in(&self.config.papers_dir)
        {
            Ok(scratch) => Some(scratch),
            Err(e) => {
                warn!("⚠️ 无法创建临时目录: {}", e);
                None
            }
        };
        let blank_page = match &scratch {
            Some(scratch) => prepare_blank_page(compiler, scratch.path()).await,
            None => None,
        };

        let targets = [
            (&self.config.papers_dir, &self.config.merged_papers_file),
            (&self.config.answers_dir, &self.config.merged_answers_file),
        ];
        for (dir, output) in targets {
            match merge_dir(pdf_tool, Path::new(dir), Path::new(output), blank_page.as_deref())
                .await
            {
                Ok(MergeOutcome::NoInputs) => warn!("⚠️ {} 中没有可合并的 PDF", dir),
                Ok(MergeOutcome::Merged { documents, padded }) => {
                    info!("✓ {}: {} 份文档, 补空白页 {} 次", output, documents, padded)
                }
                Err(e) => error!("❌ 合并 {} 失败: {}", output, e),
            }
        }
    }
}

/// 不同学号不能写到同一个输出文件
fn check_file_stems(roll_numbers: &[String]) -> AppResult<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for roll in roll_numbers {
        if let Some(first) = seen.insert(file_stem_for(roll), roll) {
            return Err(ConfigError::RollFileNameClash {
                first: first.to_string(),
                second: roll.clone(),
            }
            .into());
        }
    }
    Ok(())
}

/// 合并一个目录中的考生 PDF
async fn merge_dir(
    pdf_tool: &dyn PdfTool,
    dir: &Path,
    output: &Path,
    blank_page: Option<&Path>,
) -> AppResult<MergeOutcome> {
    let inputs = collect_inputs(dir, OUTPUT_PREFIX).await?;
    Ok(merge_documents(pdf_tool, &inputs, output, blank_page).await?)
}

/// 编译一页空白 PDF，用于补齐奇数页
async fn prepare_blank_page(compiler: &dyn DocumentCompiler, dir: &Path) -> Option<PathBuf> {
    let tex = dir.join("blank.tex");
    if let Err(e) = tokio::fs::write(&tex, blank_page_document()).await {
        warn!("⚠️ 无法写出空白页: {}", e);
        return None;
    }

    match compiler.compile(&tex).await {
        Ok(pdf) => Some(pdf),
        Err(e) => {
            warn!("⚠️ 空白页编译失败，合并时不补页: {}", e);
            None
        }
    }
}
