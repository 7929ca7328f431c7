pub mod loaders;
pub mod plan;
pub mod question;
pub mod roll;

pub use loaders::{load_question_bank, load_quiz_file, load_roll_numbers};
pub use plan::{QuizFile, QuizInfo, QuizPlan, TopicQuota};
pub use question::{QuestionBank, QuestionBlock};
pub use roll::{expand_roll_pattern, parse_roll_numbers};
