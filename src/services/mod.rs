pub mod document_builder;
pub mod option_shuffler;
pub mod question_selector;
pub mod seed;
pub mod warn_writer;

pub use document_builder::{build_document, DocumentKind};
pub use option_shuffler::randomize_options;
pub use question_selector::select_questions;
pub use seed::{derive_seed, question_seed};
pub use warn_writer::WarnWriter;
