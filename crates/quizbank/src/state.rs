//! Application state with repository-based storage.
//!
//! This module defines the shared application state that is passed to all
//! request handlers. It holds repository trait objects and the question
//! service built on top of them. The storage backend is picked by feature
//! flag.

use std::sync::Arc;

use quizbank_core::quiz::generate_demo_dataset;
use quizbank_core::storage::{LookupRepository, QuestionRepository};

use crate::config::Config;
use crate::services::QuestionService;
use crate::storage::InMemoryRepository;

/// Shared application state.
///
/// This is cloned for each request handler. Every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Question storage, used directly by the readiness probe.
    pub question_repo: Arc<dyn QuestionRepository>,
    /// Lookup table storage.
    pub lookup_repo: Arc<dyn LookupRepository>,
    /// Paginated question access.
    pub question_service: QuestionService,
}

impl AppState {
    /// Creates a new AppState from explicit repositories.
    pub fn build(
        question_repo: Arc<dyn QuestionRepository>,
        lookup_repo: Arc<dyn LookupRepository>,
    ) -> Self {
        Self {
            question_service: QuestionService::new(question_repo.clone()),
            question_repo,
            lookup_repo,
        }
    }

    /// Creates AppState from one repository implementing both traits.
    pub fn from_repository<R>(repo: Arc<R>) -> Self
    where
        R: QuestionRepository + LookupRepository + 'static,
    {
        Self::build(repo.clone(), repo)
    }

    /// Creates AppState over an in-memory store holding `count` generated
    /// demo questions.
    pub fn with_demo_data(count: u32) -> Result<Self, anyhow::Error> {
        let repo = InMemoryRepository::with_dataset(generate_demo_dataset(count))?;
        tracing::info!(questions = count, "Serving in-memory demo data");
        Ok(Self::from_repository(Arc::new(repo)))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_repository(Arc::new(InMemoryRepository::new()))
    }
}

// ============================================================================
// Factory functions for different backends
// ============================================================================

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use crate::storage::SqliteRepository;
    use quizbank_core::quiz::QuestionFilter;

    impl AppState {
        /// Creates AppState reading from the SQLite file in `config`.
        ///
        /// When `seed_demo_questions` is non-zero the file is created and
        /// filled with demo data first, unless it already holds questions.
        /// The server itself only gets a read-only handle.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            if config.seed_demo_questions > 0 {
                seed_demo_data(&config.sqlite_path, config.seed_demo_questions).await?;
            }

            let repo = SqliteRepository::open_read_only(&config.sqlite_path).await?;
            tracing::info!(path = %config.sqlite_path, "Opened question database read-only");

            Ok(Self::from_repository(Arc::new(repo)))
        }
    }

    async fn seed_demo_data(path: &str, count: u32) -> Result<(), anyhow::Error> {
        let writer = SqliteRepository::open(path).await?;

        let existing = writer.count_questions(&QuestionFilter::all()).await?;
        if existing > 0 {
            tracing::info!(
                path,
                existing,
                "Database already holds questions, skipping demo seed"
            );
            return Ok(());
        }

        writer.import_dataset(&generate_demo_dataset(count)).await?;
        Ok(())
    }

}

#[cfg(not(feature = "sqlite"))]
mod inmemory {
    use super::*;

    impl AppState {
        /// Creates AppState with in-memory storage holding generated demo
        /// questions.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            Self::with_demo_data(config.demo_question_count())
        }
    }
}
