//! Storage layer for quizbank.
//!
//! Provides the SQLite backend (behind the `sqlite` feature) and an
//! in-memory backend. Both implement the repository traits from
//! `quizbank_core::storage`.

pub mod inmemory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use inmemory::InMemoryRepository;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepository;
