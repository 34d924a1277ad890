mod dataset;
mod error;
mod mock_data;
mod pagination;
mod query;
mod types;

pub use dataset::{find_answer_overlaps, QuizDataset};
pub use error::DatasetError;
pub use mock_data::{content_id, generate_demo_dataset};
pub use pagination::{
    normalize_page, normalize_page_size, total_pages, Page, PageRequest, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
pub use query::{QuestionFilter, QuestionOrder, QuestionQuery};
pub use types::{
    Answer, AnswerId, AnswerOverlap, Category, CategoryId, Difficulty, DifficultyId,
    IncorrectAnswerLink, Question, QuestionDetails, QuestionId, QuestionType, TypeId,
};
