/// 程序配置
///
/// 路径和运行参数都可以通过环境变量覆盖，题目计划和试卷信息写在 `quiz_file` 中
#[derive(Clone, Debug)]
pub struct Config {
    /// 题库目录（每个 .tex 文件是一个专题）
    pub topics_dir: String,
    /// 试卷输出目录
    pub papers_dir: String,
    /// 答案输出目录
    pub answers_dir: String,
    /// LaTeX 导言区模板
    pub preamble_file: String,
    /// 学号列表文件
    pub roll_numbers_file: String,
    /// 试卷配置文件（专题题量、标题信息）
    pub quiz_file: String,
    /// 同时处理的考生数量
    pub max_concurrent_jobs: usize,
    /// LaTeX 编译程序
    pub latex_program: String,
    /// 每份文档编译次数（第二次用于稳定交叉引用）
    pub latex_passes: usize,
    /// PDF 工具程序
    pub qpdf_program: String,
    /// 合并后的试卷文件
    pub merged_papers_file: String,
    /// 合并后的答案文件
    pub merged_answers_file: String,
    /// 只生成 .tex，不编译也不合并
    pub skip_compile: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topics_dir: "topics".to_string(),
            papers_dir: "papers".to_string(),
            answers_dir: "answers".to_string(),
            preamble_file: "templates/preamble.tex".to_string(),
            roll_numbers_file: "roll_numbers.txt".to_string(),
            quiz_file: "quiz.toml".to_string(),
            max_concurrent_jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            latex_program: "pdflatex".to_string(),
            latex_passes: 2,
            qpdf_program: "qpdf".to_string(),
            merged_papers_file: "all_question_papers.pdf".to_string(),
            merged_answers_file: "all_answer_keys.pdf".to_string(),
            skip_compile: false,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            topics_dir: std::env::var("TOPICS_DIR").unwrap_or(default.topics_dir),
            papers_dir: std::env::var("PAPERS_DIR").unwrap_or(default.papers_dir),
            answers_dir: std::env::var("ANSWERS_DIR").unwrap_or(default.answers_dir),
            preamble_file: std::env::var("PREAMBLE_FILE").unwrap_or(default.preamble_file),
            roll_numbers_file: std::env::var("ROLL_NUMBERS_FILE")
                .unwrap_or(default.roll_numbers_file),
            quiz_file: std::env::var("QUIZ_FILE").unwrap_or(default.quiz_file),
            max_concurrent_jobs: env_positive("MAX_CONCURRENT_JOBS")
                .unwrap_or(default.max_concurrent_jobs),
            latex_program: std::env::var("LATEX_PROGRAM").unwrap_or(default.latex_program),
            latex_passes: env_positive("LATEX_PASSES").unwrap_or(default.latex_passes),
            qpdf_program: std::env::var("QPDF_PROGRAM").unwrap_or(default.qpdf_program),
            merged_papers_file: std::env::var("MERGED_PAPERS_FILE")
                .unwrap_or(default.merged_papers_file),
            merged_answers_file: std::env::var("MERGED_ANSWERS_FILE")
                .unwrap_or(default.merged_answers_file),
            skip_compile: std::env::var("SKIP_COMPILE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.skip_compile),
            verbose_logging: std::env::var("VERBOSE_LOGGING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }
}

/// 读取正整数环境变量，无法解析或为 0 时返回 `None`
fn env_positive(key: &str) -> Option<usize> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|n| *n > 0)
}
