//! Paginated question listing.
//!
//! The service owns the page policy: it normalizes whatever the caller sent,
//! asks storage for the total and the slice, and assembles a [`Page`]. Bad
//! paging input is never an error.

use std::sync::Arc;

use quizbank_core::quiz::{
    AnswerOverlap, Page, PageRequest, QuestionDetails, QuestionFilter, QuestionId, QuestionOrder,
    QuestionQuery,
};
use quizbank_core::storage::{QuestionRepository, RepositoryError, Result};

/// Serves pages of fully hydrated questions.
#[derive(Clone)]
pub struct QuestionService {
    repo: Arc<dyn QuestionRepository>,
}

impl QuestionService {
    pub fn new(repo: Arc<dyn QuestionRepository>) -> Self {
        Self { repo }
    }

    /// Returns one page of questions ordered by id.
    ///
    /// `page` below 1 becomes 1 and `page_size` outside `1..=100` becomes 25.
    /// A page past the end is empty but still reports the real total.
    pub async fn list_page(&self, page: i64, page_size: i64) -> Result<Page<QuestionDetails>> {
        let request = PageRequest::new(page, page_size);
        let filter = QuestionFilter::all();
        let query = QuestionQuery::new()
            .filter(filter.clone())
            .order_by(QuestionOrder::IdAsc)
            .page(request);

        let total_count = self.repo.count_questions(&filter).await?;
        let items = self.repo.fetch_questions(&query).await?;
        let page = Page::new(items, total_count, request);

        if page.is_empty() {
            tracing::info!(
                page = page.page,
                page_size = page.page_size,
                total_count = page.total_count,
                "No questions on requested page"
            );
        } else {
            tracing::debug!(
                page = page.page,
                page_size = page.page_size,
                returned = page.len(),
                total_count = page.total_count,
                "Fetched question page"
            );
        }

        Ok(page)
    }

    /// Gets one question with its incorrect answers.
    pub async fn get(&self, id: &QuestionId) -> Result<QuestionDetails> {
        match self.repo.get_question(id).await? {
            Some(question) => Ok(question),
            None => {
                tracing::debug!(question_id = %id, "Question not found");
                Err(RepositoryError::NotFound {
                    entity_type: "Question",
                    id: id.to_string(),
                })
            }
        }
    }

    /// Reports questions whose correct answer is also linked as incorrect.
    pub async fn audit_answer_overlaps(&self) -> Result<Vec<AnswerOverlap>> {
        let overlaps = self.repo.find_answer_overlaps().await?;
        for overlap in &overlaps {
            tracing::warn!(
                question_id = %overlap.question_id,
                answer_id = %overlap.answer_id,
                "Correct answer is also linked as incorrect"
            );
        }
        Ok(overlaps)
    }
}
