//! 试卷生成流程 - 流程层
//!
//! 核心职责：定义"一个考生"的完整处理流程
//!
//! 流程顺序：
//! 1. 抽题 → 打乱顺序 → 逐题打乱选项（试卷 / 答案两份）
//! 2. 写出 .tex
//! 3. 试卷和答案并发编译
//! 4. warn.txt（编译失败兜底）

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::infrastructure::DocumentCompiler;
use crate::models::{QuestionBank, QuizInfo, QuizPlan};
use crate::services::{
    build_document, question_seed, randomize_options, select_questions, DocumentKind, WarnWriter,
};
use crate::utils::logging::truncate_text;
use crate::workflow::participant_ctx::ParticipantCtx;

/// 一次运行中所有考生共享的只读数据
#[derive(Debug, Clone)]
pub struct QuizContext {
    pub plan: QuizPlan,
    pub bank: QuestionBank,
    pub info: QuizInfo,
}

/// 一个考生的试卷和答案
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPair {
    pub paper: String,
    pub key: String,
    pub question_count: usize,
    pub total_marks: u32,
}

/// 为一个考生生成试卷和答案
///
/// 试卷和答案使用同一组题目、同一顺序、同一组选项种子，只有正确选项标记不同。
/// 计划中的专题都不在题库里时生成空白试卷，不报错。
pub fn generate_pair(roll_number: &str, quiz: &QuizContext) -> GeneratedPair {
    let main_seed = crate::services::derive_seed(roll_number);
    let selected = select_questions(&quiz.plan, &quiz.bank, main_seed);

    let mut paper_questions = Vec::with_capacity(selected.len());
    let mut key_questions = Vec::with_capacity(selected.len());
    for (i, question) in selected.iter().enumerate() {
        let seed = question_seed(main_seed, i);
        paper_questions.push(randomize_options(
            &question.text,
            seed,
            DocumentKind::Paper.preserve_correct(),
        ));
        key_questions.push(randomize_options(
            &question.text,
            seed,
            DocumentKind::AnswerKey.preserve_correct(),
        ));
    }

    let total_marks = selected.iter().filter_map(|q| q.marks).sum();

    GeneratedPair {
        paper: build_document(
            roll_number,
            &quiz.info,
            total_marks,
            &paper_questions,
            DocumentKind::Paper,
        ),
        key: build_document(
            roll_number,
            &quiz.info,
            total_marks,
            &key_questions,
            DocumentKind::AnswerKey,
        ),
        question_count: selected.len(),
        total_marks,
    }
}

/// 考生处理状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessResult {
    /// 只写出了 .tex（未编译）
    Generated,
    /// 试卷和答案都编译成功
    Compiled,
    /// 编译失败，该考生被跳过
    Skipped { stage: String, reason: String },
}

/// 单个考生的处理报告，写入 manifest.json
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantReport {
    pub roll_number: String,
    pub seed: u64,
    pub question_count: usize,
    pub total_marks: u32,
    pub paper_tex: PathBuf,
    pub key_tex: PathBuf,
    #[serde(flatten)]
    pub result: ProcessResult,
}

/// 试卷生成流程
///
/// - 编排一个考生的完整处理流程
/// - 不持有随机状态：每个考生的随机源在抽题 / 打乱时由种子重新创建
/// - 编译器通过 trait 注入
pub struct PaperFlow {
    compiler: Option<Arc<dyn DocumentCompiler>>,
    warn_writer: Arc<WarnWriter>,
    papers_dir: PathBuf,
    answers_dir: PathBuf,
    verbose_logging: bool,
}

impl PaperFlow {
    /// 创建新的流程
    ///
    /// `compiler` 为 `None` 时只写出 .tex。
    pub fn new(
        compiler: Option<Arc<dyn DocumentCompiler>>,
        warn_writer: Arc<WarnWriter>,
        papers_dir: impl Into<PathBuf>,
        answers_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            compiler,
            warn_writer,
            papers_dir: papers_dir.into(),
            answers_dir: answers_dir.into(),
            verbose_logging: false,
        }
    }

    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    pub async fn run(&self, ctx: &ParticipantCtx, quiz: &QuizContext) -> Result<ParticipantReport> {
        info!("{} 🎲 主种子: {}", ctx, ctx.main_seed);

        let pair = generate_pair(&ctx.roll_number, quiz);
        if pair.question_count == 0 {
            warn!("{} ⚠️ 没有抽到任何题目，生成空白试卷", ctx);
        } else {
            info!(
                "{} ✓ 抽取 {} 道题目, 总分 {}",
                ctx, pair.question_count, pair.total_marks
            );
        }

        let stem = ctx.file_stem();
        let paper_tex = self.papers_dir.join(format!("{}.tex", stem));
        let key_tex = self.answers_dir.join(format!("{}_answers.tex", stem));

        write_tex(&paper_tex, &pair.paper).await?;
        write_tex(&key_tex, &pair.key).await?;

        if self.verbose_logging {
            info!("{} 已写出: {} / {}", ctx, paper_tex.display(), key_tex.display());
        }

        let result = match &self.compiler {
            Some(compiler) => {
                self.compile_pair(ctx, compiler.as_ref(), &paper_tex, &key_tex)
                    .await?
            }
            None => ProcessResult::Generated,
        };

        Ok(ParticipantReport {
            roll_number: ctx.roll_number.clone(),
            seed: ctx.main_seed,
            question_count: pair.question_count,
            total_marks: pair.total_marks,
            paper_tex,
            key_tex,
            result,
        })
    }

    /// 并发编译试卷和答案
    async fn compile_pair(
        &self,
        ctx: &ParticipantCtx,
        compiler: &dyn DocumentCompiler,
        paper_tex: &Path,
        key_tex: &Path,
    ) -> Result<ProcessResult> {
        info!("{} 📄 正在编译试卷和答案...", ctx);

        let (paper, key) = tokio::join!(compiler.compile(paper_tex), compiler.compile(key_tex));

        for (kind, outcome) in [(DocumentKind::Paper, &paper), (DocumentKind::AnswerKey, &key)] {
            if let Err(e) = outcome {
                let stage = format!("编译{}", kind.label());
                error!(
                    "{} ❌ {}失败: {}",
                    ctx,
                    stage,
                    truncate_text(&e.to_string(), 200)
                );
                self.warn_writer
                    .write(&ctx.roll_number, &stage, &e.to_string())
                    .await?;

                // 失败时编译器可能已经写出 PDF，上一次运行也可能留下旧文件：
                // 两份都删掉，保证合并结果里试卷和答案一一对应
                for pdf in [paper_tex, key_tex].map(|tex| tex.with_extension("pdf")) {
                    if tokio::fs::remove_file(&pdf).await.is_ok() {
                        debug!("{} 已删除 {}", ctx, pdf.display());
                    }
                }

                return Ok(ProcessResult::Skipped {
                    stage,
                    reason: e.to_string(),
                });
            }
        }

        info!("{} ✓ 编译完成", ctx);
        Ok(ProcessResult::Compiled)
    }
}

async fn write_tex(path: &Path, content: &str) -> Result<()> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
    Ok(())
}
