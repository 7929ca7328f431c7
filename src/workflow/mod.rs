pub mod paper_flow;
pub mod participant_ctx;

pub use paper_flow::{
    generate_pair, GeneratedPair, PaperFlow, ParticipantReport, ProcessResult, QuizContext,
};
pub use participant_ctx::{file_stem_for, ParticipantCtx};
