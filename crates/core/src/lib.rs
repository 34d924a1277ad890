//! Functional core for quizbank.
//!
//! Pure types and functions for the trivia dataset: entity shapes, the paging
//! policy, lazily composed question queries and the repository traits that
//! storage backends implement. Nothing in this crate performs I/O.

pub mod quiz;
pub mod storage;
