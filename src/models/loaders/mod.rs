pub mod toml_loader;
pub mod topic_loader;

pub use toml_loader::{load_quiz_file, load_roll_numbers};
pub use topic_loader::{load_question_bank, parse_topic};
