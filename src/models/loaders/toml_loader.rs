use crate::error::{AppError, FileError};
use crate::models::plan::QuizFile;
use crate::models::roll::{collect_roll_numbers, parse_roll_numbers};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载试卷配置
pub async fn load_quiz_file(toml_file_path: &Path) -> Result<QuizFile> {
    let path = toml_file_path.display().to_string();
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(path.clone(), e))
        .context("无法读取试卷配置文件")?;

    let quiz: QuizFile =
        toml::from_str(&content).map_err(|e| AppError::toml_parse_failed(path, e))?;

    tracing::info!(
        "试卷配置: {} 个专题, 计划抽取 {} 道题目",
        quiz.topics.quotas().len(),
        quiz.topics.requested()
    );

    Ok(quiz)
}

/// 加载学号列表
///
/// 学号文件和 quiz.toml 中的 `rolls` 依次合并、展开并去重。
/// 两处都没有学号时学号文件必须存在，否则整个运行失败。
pub async fn load_roll_numbers(roll_file_path: &Path, extra: &[String]) -> Result<Vec<String>> {
    let mut rolls = if roll_file_path.exists() {
        let content = fs::read_to_string(roll_file_path)
            .await
            .with_context(|| format!("无法读取学号文件: {}", roll_file_path.display()))?;
        parse_roll_numbers(&content)?
    } else if extra.is_empty() {
        return Err(AppError::File(FileError::NotFound {
            path: roll_file_path.display().to_string(),
        })
        .into());
    } else {
        Vec::new()
    };

    for roll in collect_roll_numbers(extra.iter().map(String::as_str))? {
        if !rolls.contains(&roll) {
            rolls.push(roll);
        }
    }

    Ok(rolls)
}
