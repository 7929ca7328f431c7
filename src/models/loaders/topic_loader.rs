use crate::error::{AppError, FileError};
use crate::models::question::{QuestionBank, QuestionBlock, QUESTION_BEGIN};
use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs;

const MARKS_PATTERN: &str = r"\[(\d+)\]";

/// 把一个专题文件的内容拆成题目列表
///
/// 第一个 `\begin{question}` 之前的内容被丢弃；每道题读取第一个 `[n]` 分值后
/// 去掉所有分值标注；去掉后只剩空白的片段被丢弃。
pub fn parse_topic(content: &str) -> Result<Vec<QuestionBlock>> {
    let marks_re = Regex::new(MARKS_PATTERN)?;

    let questions = content
        .split(QUESTION_BEGIN)
        .skip(1)
        .filter_map(|fragment| {
            let marks = marks_re
                .captures(fragment)
                .and_then(|caps| caps[1].parse::<u32>().ok());
            let stripped = marks_re.replace_all(fragment, "");
            if stripped.trim().is_empty() {
                return None;
            }
            let block = QuestionBlock::new(format!("{}{}", QUESTION_BEGIN, stripped));
            Some(match marks {
                Some(m) => block.with_marks(m),
                None => block,
            })
        })
        .collect();

    Ok(questions)
}

/// 从单个 .tex 文件加载专题，专题名为文件名（不含扩展名）
pub async fn load_topic_file(path: &Path) -> Result<(String, Vec<QuestionBlock>)> {
    let topic = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("无法识别专题名: {}", path.display()))?
        .to_string();

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let questions = parse_topic(&content)?;
    Ok((topic, questions))
}

/// 从题库目录加载所有专题
///
/// 任何一个专题文件读取失败都会让整个加载失败，不返回不完整的题库。
pub async fn load_question_bank(topics_dir: &str) -> Result<QuestionBank> {
    let folder = PathBuf::from(topics_dir);

    if !folder.exists() {
        return Err(AppError::File(FileError::DirectoryNotFound {
            path: topics_dir.to_string(),
        })
        .into());
    }

    let mut tex_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取题库目录: {}", topics_dir))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(topics_dir, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("tex") {
            tex_files.push(path);
        }
    }
    tex_files.sort();

    let mut bank = QuestionBank::new();
    for path in tex_files {
        let (topic, questions) = load_topic_file(&path).await?;
        tracing::info!("专题 {}: 加载 {} 道题目", topic, questions.len());
        let without_options = questions.iter().filter(|q| !q.has_options()).count();
        if without_options > 0 {
            tracing::warn!(
                "⚠️ 专题 {} 中有 {} 道题目没有选项块，选项不会被打乱",
                topic,
                without_options
            );
        }
        bank.insert_topic(topic, questions);
    }

    if bank.is_empty() {
        tracing::warn!("⚠️ 题库目录 {} 中没有找到 .tex 文件", topics_dir);
    }

    Ok(bank)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPIC: &str = r"% semiconductor questions
\begin{question}[2] Which carrier dominates in n-type silicon?
\begin{oneparcheckboxes}
\choice Holes
\correctchoice Electrons
\end{oneparcheckboxes}
\end{question}

\begin{question} The band gap of Si is roughly [1]
\begin{oneparcheckboxes}
\correctchoice 1.1 eV
\choice 3.4 eV
\end{oneparcheckboxes}
\end{question}
";

    #[test]
    fn test_parse_topic_splits_and_strips_marks() {
        let questions = parse_topic(TOPIC).unwrap();
        assert_eq!(questions.len(), 2);

        assert!(questions[0].text.starts_with("\\begin{question} Which carrier"));
        assert_eq!(questions[0].marks, Some(2));
        assert_eq!(questions[1].marks, Some(1));
        assert!(questions.iter().all(|q| !q.text.contains("[2]") && !q.text.contains("[1]")));
    }

    #[test]
    fn test_parse_topic_drops_preamble_and_empty_fragments() {
        let questions = parse_topic("header text\\begin{question}  \n\\begin{question} Q").unwrap();
        assert_eq!(questions, vec![QuestionBlock::new("\\begin{question} Q")]);
    }

    #[test]
    fn test_parse_topic_without_questions() {
        assert!(parse_topic("just a comment").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_question_bank_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("semiconductors.tex"), TOPIC).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let bank = load_question_bank(dir.path().to_str().unwrap()).await.unwrap();
        assert_eq!(bank.topic_count(), 1);
        assert_eq!(bank.topic("semiconductors").map(|q| q.len()), Some(2));
    }

    #[tokio::test]
    async fn test_load_question_bank_missing_dir_fails() {
        let err = load_question_bank("/nonexistent/topics/dir").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::File(FileError::DirectoryNotFound { .. }))
        ));
    }
}
