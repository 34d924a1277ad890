use async_trait::async_trait;

use crate::quiz::{
    AnswerOverlap, Category, Difficulty, QuestionDetails, QuestionFilter, QuestionId,
    QuestionQuery, QuestionType,
};

use super::Result;

/// Read access to questions.
///
/// Nothing here mutates storage. Implementations must hydrate every
/// returned question in the same round trip as the question rows and must
/// honour the query's ordering and slice exactly.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Counts the questions matching a filter.
    async fn count_questions(&self, filter: &QuestionFilter) -> Result<u64>;

    /// Fetches the questions described by a query, joined with their
    /// category, difficulty, type and correct answer.
    async fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<QuestionDetails>>;

    /// Gets a single question with its incorrect answers.
    async fn get_question(&self, id: &QuestionId) -> Result<Option<QuestionDetails>>;

    /// Lists incorrect-answer links that repeat the question's correct answer.
    async fn find_answer_overlaps(&self) -> Result<Vec<AnswerOverlap>>;
}

/// Read access to the lookup tables.
#[async_trait]
pub trait LookupRepository: Send + Sync {
    /// Lists all categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Lists all difficulties ordered by name.
    async fn list_difficulties(&self) -> Result<Vec<Difficulty>>;

    /// Lists all question types ordered by name.
    async fn list_question_types(&self) -> Result<Vec<QuestionType>>;

    /// Lists every category with the number of questions in it, ordered by
    /// name. Categories without questions report zero.
    async fn category_question_counts(&self) -> Result<Vec<(Category, u64)>>;
}
