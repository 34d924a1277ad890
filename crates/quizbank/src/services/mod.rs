//! Application services sitting between handlers and storage.

pub mod questions;

pub use questions::QuestionService;
