pub mod error;
pub mod health;
pub mod lookups;
pub mod questions;

pub use error::AppError;
