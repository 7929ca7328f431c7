use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use texmcq::config::Config;
use texmcq::infrastructure::{DocumentCompiler, DocumentError, PdfTool};
use texmcq::models::{load_question_bank, load_quiz_file};
use texmcq::{App, ProcessResult, QuizContext};

const TOPIC_A: &str = r"intro text
\begin{question} [1] Alpha one
\begin{oneparcheckboxes}
\choice a1
\correctchoice a2
\choice a3
\end{oneparcheckboxes}
\end{question}
\begin{question} [2] Alpha two
\begin{oneparcheckboxes}
\correctchoice b1
\choice b2
\end{oneparcheckboxes}
\end{question}
\begin{question} [1] Alpha three
\begin{oneparcheckboxes}
\choice c1
\choice c2
\correctchoice c3
\end{oneparcheckboxes}
\end{question}
";

const TOPIC_B: &str = r"\begin{question} [5] Beta one
\begin{oneparcheckboxes}
\choice d1
\correctchoice {d2 \textbf{bold}}
\end{oneparcheckboxes}
\end{question}
";

const QUIZ_TOML: &str = r#"
rolls = ["BT24ECE01...03"]

[info]
institute = "Institute"
department = "Department"
course_code = "PHL102"
quiz_title = "QUIZ 1"

[[topics]]
name = "alpha"
count = 2

[[topics]]
name = "beta"
count = 1

[[topics]]
name = "gamma"
count = 4
"#;

/// 在临时目录中准备题库和配置
fn setup(root: &Path) -> Config {
    let topics = root.join("topics");
    std::fs::create_dir_all(&topics).unwrap();
    std::fs::write(topics.join("alpha.tex"), TOPIC_A).unwrap();
    std::fs::write(topics.join("beta.tex"), TOPIC_B).unwrap();
    std::fs::write(root.join("quiz.toml"), QUIZ_TOML).unwrap();
    std::fs::write(root.join("preamble.tex"), "\\documentclass{exam}\n").unwrap();

    let path = |p: &str| root.join(p).display().to_string();
    Config {
        topics_dir: path("topics"),
        papers_dir: path("papers"),
        answers_dir: path("answers"),
        preamble_file: path("preamble.tex"),
        roll_numbers_file: path("roll_numbers.txt"),
        quiz_file: path("quiz.toml"),
        max_concurrent_jobs: 2,
        merged_papers_file: path("all_question_papers.pdf"),
        merged_answers_file: path("all_answer_keys.pdf"),
        skip_compile: true,
        output_log_file: path("output.txt"),
        ..Config::default()
    }
}

async fn quiz_context(config: &Config) -> QuizContext {
    let quiz_file = load_quiz_file(Path::new(&config.quiz_file)).await.unwrap();
    QuizContext {
        plan: quiz_file.topics,
        bank: load_question_bank(&config.topics_dir).await.unwrap(),
        info: quiz_file.info,
    }
}

/// 假编译器：在 .tex 旁边写一个同名 .pdf；文件名等于 `fail_on` 时写完 PDF 仍返回编译错误
/// （和 pdflatex 在 nonstopmode 下出错的表现一致）
struct FakeCompiler {
    fail_on: Option<String>,
}

#[async_trait]
impl DocumentCompiler for FakeCompiler {
    async fn compile(&self, tex_path: &Path) -> Result<PathBuf, DocumentError> {
        let name = tex_path.file_name().unwrap().to_string_lossy().to_string();
        let pdf = tex_path.with_extension("pdf");
        tokio::fs::write(&pdf, "%PDF").await?;

        if self.fail_on.as_deref() == Some(name.as_str()) {
            return Err(DocumentError::Compile {
                path: tex_path.to_path_buf(),
                diagnostics: "! Undefined control sequence.".to_string(),
            });
        }
        Ok(pdf)
    }
}

/// 假 PDF 工具：每个文档一页，拼接时把输入文件名写进输出
#[derive(Default)]
struct FakePdfTool {
    concatenated: Mutex<Vec<Vec<PathBuf>>>,
}

#[async_trait]
impl PdfTool for FakePdfTool {
    async fn page_count(&self, _pdf: &Path) -> Result<usize, DocumentError> {
        Ok(1)
    }

    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), DocumentError> {
        self.concatenated.lock().unwrap().push(inputs.to_vec());
        let listing: Vec<String> = inputs.iter().map(|p| p.display().to_string()).collect();
        tokio::fs::write(output, listing.join("\n")).await?;
        Ok(())
    }
}

#[tokio::test]
async fn test_generate_tex_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let papers_dir = PathBuf::from(&config.papers_dir);
    let answers_dir = PathBuf::from(&config.answers_dir);

    let summary = App::initialize(config).await.unwrap().run().await.unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.success, 3);
    assert_eq!(summary.failed, 0);

    for roll in ["BT24ECE01", "BT24ECE02", "BT24ECE03"] {
        let paper = std::fs::read_to_string(papers_dir.join(format!("quiz_{}.tex", roll))).unwrap();
        let key = std::fs::read_to_string(answers_dir.join(format!("quiz_{}_answers.tex", roll)))
            .unwrap();

        assert_eq!(paper.matches("\\begin{question}").count(), 3);
        assert!(!paper.contains("\\correctchoice"));
        assert_eq!(key.matches("\\correctchoice").count(), 3);
        assert!(key.contains("\\printanswers"));
        assert!(paper.contains("Beta one"));
        assert!(!paper.contains("[5]"));
    }

    assert!(papers_dir.join("preamble.tex").exists());
    assert!(answers_dir.join("preamble.tex").exists());
    assert!(!papers_dir.join("warn.txt").exists());
}

#[tokio::test]
async fn test_generation_is_reproducible_across_runs() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    let mut outputs = Vec::new();
    for dir in [&first, &second] {
        let config = setup(dir.path());
        let papers_dir = PathBuf::from(&config.papers_dir);
        App::initialize(config).await.unwrap().run().await.unwrap();
        outputs.push(std::fs::read_to_string(papers_dir.join("quiz_BT24ECE02.tex")).unwrap());
    }

    assert_eq!(outputs[0], outputs[1]);
}

#[tokio::test]
async fn test_manifest_lists_participants_in_roll_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let manifest_path = PathBuf::from(&config.papers_dir).join("manifest.json");

    App::initialize(config).await.unwrap().run().await.unwrap();

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(manifest_path).unwrap()).unwrap();
    let entries = manifest.as_array().unwrap();
    let rolls: Vec<&str> = entries
        .iter()
        .map(|e| e["roll_number"].as_str().unwrap())
        .collect();
    assert_eq!(rolls, vec!["BT24ECE01", "BT24ECE02", "BT24ECE03"]);
    assert_eq!(entries[0]["status"], "generated");
    assert_eq!(entries[0]["question_count"], 3);
    assert_eq!(entries[0]["seed"], texmcq::services::derive_seed("BT24ECE01"));
}

#[tokio::test]
async fn test_compile_failure_skips_only_that_participant() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = setup(dir.path());
    config.skip_compile = false;
    let papers_dir = PathBuf::from(&config.papers_dir);
    let answers_dir = PathBuf::from(&config.answers_dir);
    let merged_papers = PathBuf::from(&config.merged_papers_file);
    let merged_answers = PathBuf::from(&config.merged_answers_file);

    let quiz = quiz_context(&config).await;
    let rolls = vec!["A1".to_string(), "A2".to_string(), "A3".to_string()];
    let compiler = Arc::new(FakeCompiler {
        fail_on: Some("quiz_A2.tex".to_string()),
    });
    let pdf_tool = Arc::new(FakePdfTool::default());

    let app = App::from_parts(
        config,
        quiz,
        rolls,
        Some(compiler as Arc<dyn DocumentCompiler>),
        Some(pdf_tool.clone() as Arc<dyn PdfTool>),
    )
    .unwrap();
    let summary = app.run().await.unwrap();

    assert_eq!(summary.success, 2);
    assert_eq!(summary.failed, 1);
    let skipped = summary
        .reports
        .iter()
        .find(|r| r.roll_number == "A2")
        .unwrap();
    assert!(matches!(skipped.result, ProcessResult::Skipped { .. }));
    assert!(summary
        .reports
        .iter()
        .filter(|r| r.roll_number != "A2")
        .all(|r| r.result == ProcessResult::Compiled));

    let warn = std::fs::read_to_string(papers_dir.join("warn.txt")).unwrap();
    assert!(warn.contains("A2"));
    assert!(warn.contains("Undefined control sequence"));

    // 跳过的考生的试卷和答案 PDF 都不进入合并结果
    assert!(!papers_dir.join("quiz_A2.pdf").exists());
    assert!(!answers_dir.join("quiz_A2_answers.pdf").exists());

    // 每个文档一页，合并时每份后面补一页空白
    let merged = std::fs::read_to_string(&merged_papers).unwrap();
    assert_eq!(merged.lines().filter(|l| l.ends_with("blank.pdf")).count(), 2);
    assert!(merged.contains("quiz_A1.pdf"));
    assert!(!merged.contains("quiz_A2.pdf"));
    let merged_keys = std::fs::read_to_string(&merged_answers).unwrap();
    assert!(merged_keys.contains("quiz_A1_answers.pdf"));
    assert!(!merged_keys.contains("quiz_A2_answers.pdf"));
    assert_eq!(pdf_tool.concatenated.lock().unwrap().len(), 2);

    // 空白页临时目录已清理
    let leftovers = std::fs::read_dir(&papers_dir)
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .file_name()
                .to_string_lossy()
                .starts_with(".blank_page")
        })
        .count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_existing_folder_named_like_scratch_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = setup(dir.path());
    config.skip_compile = false;
    let kept = PathBuf::from(&config.papers_dir).join(".blank_page");
    std::fs::create_dir_all(&kept).unwrap();
    std::fs::write(kept.join("notes.txt"), "mine").unwrap();

    let quiz = quiz_context(&config).await;
    let app = App::from_parts(
        config,
        quiz,
        vec!["A1".to_string()],
        Some(Arc::new(FakeCompiler { fail_on: None }) as Arc<dyn DocumentCompiler>),
        Some(Arc::new(FakePdfTool::default()) as Arc<dyn PdfTool>),
    )
    .unwrap();
    app.run().await.unwrap();

    assert_eq!(std::fs::read_to_string(kept.join("notes.txt")).unwrap(), "mine");
}

#[tokio::test]
async fn test_missing_topics_dir_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = setup(dir.path());
    config.topics_dir = dir.path().join("nowhere").display().to_string();

    assert!(App::initialize(config).await.is_err());
}

#[tokio::test]
async fn test_empty_roll_list_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let quiz = quiz_context(&config).await;

    assert!(App::from_parts(config, quiz, Vec::new(), None, None).is_err());
}

#[tokio::test]
async fn test_rolls_sharing_output_file_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let quiz = quiz_context(&config).await;

    let rolls = vec!["A/1".to_string(), "A_1".to_string()];
    let err = App::from_parts(config, quiz, rolls, None, None).err().unwrap();
    assert!(err.to_string().contains("A/1"));
    assert!(err.to_string().contains("A_1"));
}

#[test]
fn test_quiz_file_keeps_topic_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());

    let quiz = tokio_test::block_on(load_quiz_file(Path::new(&config.quiz_file))).unwrap();
    let names: Vec<&str> = quiz.topics.quotas().iter().map(|q| q.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    assert_eq!(quiz.topics.requested(), 7);
}
