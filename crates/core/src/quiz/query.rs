//! Lazily composed question queries.
//!
//! A [`QuestionQuery`] only describes what to read. Storage backends turn it
//! into I/O when one of the terminal repository operations
//! (`count_questions`, `fetch_questions`) is invoked. The category,
//! difficulty, type and correct answer are always joined; incorrect answers
//! are opt-in through [`QuestionQuery::with_incorrect_answers`].

use super::pagination::PageRequest;
use super::types::{CategoryId, DifficultyId, Question, TypeId};

/// Equality filters over a question's lookup references.
///
/// The default filter matches every question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    pub category_id: Option<CategoryId>,
    pub difficulty_id: Option<DifficultyId>,
    pub type_id: Option<TypeId>,
}

impl QuestionFilter {
    /// A filter that matches every question.
    pub fn all() -> Self {
        Self::default()
    }

    /// Returns true if no constraint is set.
    pub fn is_unfiltered(&self) -> bool {
        self.category_id.is_none() && self.difficulty_id.is_none() && self.type_id.is_none()
    }

    /// Evaluates the filter against a stored question.
    pub fn matches(&self, question: &Question) -> bool {
        self.category_id
            .as_ref()
            .is_none_or(|id| id == &question.category_id)
            && self
                .difficulty_id
                .as_ref()
                .is_none_or(|id| id == &question.difficulty_id)
            && self
                .type_id
                .as_ref()
                .is_none_or(|id| id == &question.type_id)
    }
}

/// Result ordering. Every variant is total, so pages are stable across calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuestionOrder {
    /// Question id ascending.
    #[default]
    IdAsc,
    /// Question id descending.
    IdDesc,
    /// Question text ascending, ties broken by id ascending.
    TextAsc,
}

/// Description of a question read: filter, ordering, slice and which
/// optional relations to load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionQuery {
    filter: QuestionFilter,
    order: QuestionOrder,
    offset: u64,
    limit: Option<u64>,
    incorrect_answers: bool,
}

impl QuestionQuery {
    /// Every question, ordered by id ascending, without a slice.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: QuestionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn in_category(mut self, category_id: impl Into<CategoryId>) -> Self {
        self.filter.category_id = Some(category_id.into());
        self
    }

    pub fn with_difficulty(mut self, difficulty_id: impl Into<DifficultyId>) -> Self {
        self.filter.difficulty_id = Some(difficulty_id.into());
        self
    }

    pub fn of_type(mut self, type_id: impl Into<TypeId>) -> Self {
        self.filter.type_id = Some(type_id.into());
        self
    }

    pub fn order_by(mut self, order: QuestionOrder) -> Self {
        self.order = order;
        self
    }

    /// Also load each question's incorrect answers.
    pub fn with_incorrect_answers(mut self) -> Self {
        self.incorrect_answers = true;
        self
    }

    /// Skips `offset` rows and keeps at most `limit`.
    pub fn slice(mut self, offset: u64, limit: u64) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// Restricts the query to one normalized page.
    pub fn page(self, request: PageRequest) -> Self {
        self.slice(request.offset(), request.limit())
    }

    pub fn filter_ref(&self) -> &QuestionFilter {
        &self.filter
    }

    pub fn order(&self) -> QuestionOrder {
        self.order
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn includes_incorrect_answers(&self) -> bool {
        self.incorrect_answers
    }
}
