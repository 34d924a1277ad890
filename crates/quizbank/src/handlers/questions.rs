//! Question handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use quizbank_core::quiz::{Page, QuestionDetails, QuestionId, DEFAULT_PAGE_SIZE};

use crate::{handlers::AppError, state::AppState};

/// Query parameters for listing questions.
///
/// Both are optional and any integer is accepted; the service normalizes
/// them.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuestionsQuery {
    pub page: Option<i64>,
    #[serde(rename = "pageSize", alias = "page_size")]
    pub page_size: Option<i64>,
}

/// List one page of questions (GET /api/questions).
pub async fn list_questions(
    State(state): State<AppState>,
    Query(query): Query<ListQuestionsQuery>,
) -> Result<Json<Page<QuestionDetails>>, AppError> {
    let page_size = query
        .page_size
        .unwrap_or_else(|| i64::from(DEFAULT_PAGE_SIZE));
    let page = state
        .question_service
        .list_page(query.page.unwrap_or(1), page_size)
        .await?;

    Ok(Json(page))
}

/// Get a single question with its incorrect answers (GET /api/questions/{id}).
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QuestionDetails>, AppError> {
    let question = state.question_service.get(&QuestionId::new(id)).await?;
    Ok(Json(question))
}
