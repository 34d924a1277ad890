use std::{env, time::Duration};

/// Demo questions generated for in-memory serving when no count is given.
pub const DEFAULT_DEMO_QUESTIONS: u32 = 100;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file (default: "quizbank.db")
    pub sqlite_path: String,
    /// Per-request timeout in seconds (default: 10)
    pub request_timeout_secs: u64,
    /// Number of demo questions to seed before serving (default: 0, no seeding)
    pub seed_demo_questions: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SQLITE_PATH` - SQLite database path (default: "quizbank.db")
    /// - `REQUEST_TIMEOUT_SECS` - Request timeout in seconds (default: 10)
    /// - `SEED_DEMO_QUESTIONS` - Demo questions to seed at startup (default: 0)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            sqlite_path: lookup("SQLITE_PATH").unwrap_or_else(|| "quizbank.db".to_string()),
            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(10),
            seed_demo_questions: lookup("SEED_DEMO_QUESTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Questions to generate when serving from memory: the seed count if one
    /// was set, otherwise [`DEFAULT_DEMO_QUESTIONS`].
    pub fn demo_question_count(&self) -> u32 {
        match self.seed_demo_questions {
            0 => DEFAULT_DEMO_QUESTIONS,
            count => count,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
