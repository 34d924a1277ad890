//! Lookup table handlers.

use axum::{extract::State, Json};
use serde::Serialize;

use quizbank_core::quiz::{Category, Difficulty, QuestionType};

use crate::{handlers::AppError, state::AppState};

/// A category and how many questions it holds.
#[derive(Debug, Serialize)]
pub struct CategoryStats {
    #[serde(flatten)]
    pub category: Category,
    pub question_count: u64,
}

/// List all categories (GET /api/categories).
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.lookup_repo.list_categories().await?))
}

/// List all difficulties (GET /api/difficulties).
pub async fn list_difficulties(
    State(state): State<AppState>,
) -> Result<Json<Vec<Difficulty>>, AppError> {
    Ok(Json(state.lookup_repo.list_difficulties().await?))
}

/// List all question types (GET /api/types).
pub async fn list_question_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionType>>, AppError> {
    Ok(Json(state.lookup_repo.list_question_types().await?))
}

/// List categories with their question counts (GET /api/categories/stats).
pub async fn category_stats(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryStats>>, AppError> {
    let stats = state
        .lookup_repo
        .category_question_counts()
        .await?
        .into_iter()
        .map(|(category, question_count)| CategoryStats {
            category,
            question_count,
        })
        .collect();

    Ok(Json(stats))
}
