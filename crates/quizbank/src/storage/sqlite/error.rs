//! SQLite error mapping.
//!
//! Folds `tokio_rusqlite::Error` and `rusqlite::Error` into `RepositoryError`.
//! Constraint failures become the semantic variants the HTTP layer maps to
//! 409.

use quizbank_core::storage::RepositoryError;
use rusqlite::ffi;

const FOREIGN_KEY_MESSAGE: &str = "FOREIGN KEY constraint failed";

/// Whether a constraint failure came from a foreign key.
///
/// Immediate checks report `SQLITE_CONSTRAINT_FOREIGNKEY`. `ON DELETE
/// RESTRICT` actions run as triggers and report `SQLITE_CONSTRAINT_TRIGGER`
/// with the foreign key message instead.
fn is_foreign_key_failure(err: &ffi::Error, message: Option<&str>) -> bool {
    match err.extended_code {
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => true,
        ffi::SQLITE_CONSTRAINT_TRIGGER => {
            message.is_some_and(|m| m.contains(FOREIGN_KEY_MESSAGE))
        }
        _ => false,
    }
}

fn map_rusqlite_error(err: &rusqlite::Error, entity_type: &'static str) -> RepositoryError {
    match err {
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || sqlite_err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            RepositoryError::AlreadyExists {
                entity_type,
                id: "unknown".to_string(), // not reported by SQLite
            }
        }

        rusqlite::Error::SqliteFailure(sqlite_err, message)
            if is_foreign_key_failure(sqlite_err, message.as_deref()) =>
        {
            RepositoryError::IntegrityViolation(format!(
                "Foreign key constraint violation for {entity_type}"
            ))
        }

        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.code == rusqlite::ErrorCode::CannotOpen =>
        {
            RepositoryError::ConnectionFailed(format!("Cannot open database: {err}"))
        }

        // Writes against a handle opened read-only
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.code == rusqlite::ErrorCode::ReadOnly =>
        {
            RepositoryError::QueryFailed(format!("Database is read-only: {err}"))
        }

        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => {
            RepositoryError::InvalidData(format!("Malformed {entity_type} row: {err}"))
        }

        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

/// Maps a tokio_rusqlite error to a RepositoryError.
pub fn map_tokio_rusqlite_error(
    err: tokio_rusqlite::Error,
    entity_type: &'static str,
) -> RepositoryError {
    match &err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => {
            map_rusqlite_error(rusqlite_err, entity_type)
        }
        tokio_rusqlite::Error::Close(_) | tokio_rusqlite::Error::ConnectionClosed => {
            RepositoryError::ConnectionFailed("Connection closed unexpectedly".to_string())
        }
        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint_failure(extended_code: i32, message: Option<&str>) -> tokio_rusqlite::Error {
        let sqlite_err = ffi::Error {
            code: rusqlite::ErrorCode::ConstraintViolation,
            extended_code,
        };
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
            sqlite_err,
            message.map(str::to_string),
        ))
    }

    #[test]
    fn test_unique_constraint_maps_to_already_exists() {
        let result = map_tokio_rusqlite_error(
            constraint_failure(ffi::SQLITE_CONSTRAINT_UNIQUE, None),
            "Category",
        );

        assert!(matches!(
            result,
            RepositoryError::AlreadyExists {
                entity_type: "Category",
                ..
            }
        ));
    }

    #[test]
    fn test_primary_key_maps_to_already_exists() {
        let result = map_tokio_rusqlite_error(
            constraint_failure(ffi::SQLITE_CONSTRAINT_PRIMARYKEY, None),
            "IncorrectAnswerLink",
        );

        assert!(matches!(result, RepositoryError::AlreadyExists { .. }));
    }

    #[test]
    fn test_foreign_key_maps_to_integrity_violation() {
        let result = map_tokio_rusqlite_error(
            constraint_failure(ffi::SQLITE_CONSTRAINT_FOREIGNKEY, Some(FOREIGN_KEY_MESSAGE)),
            "Question",
        );

        assert!(matches!(result, RepositoryError::IntegrityViolation(_)));
    }

    #[test]
    fn test_restrict_action_maps_to_integrity_violation() {
        // extended code 1811
        let result = map_tokio_rusqlite_error(
            constraint_failure(ffi::SQLITE_CONSTRAINT_TRIGGER, Some(FOREIGN_KEY_MESSAGE)),
            "Category",
        );

        assert!(matches!(result, RepositoryError::IntegrityViolation(_)));
    }

    #[test]
    fn test_other_trigger_failure_maps_to_query_failed() {
        let result = map_tokio_rusqlite_error(
            constraint_failure(ffi::SQLITE_CONSTRAINT_TRIGGER, Some("custom abort")),
            "Category",
        );

        assert!(matches!(result, RepositoryError::QueryFailed(_)));
    }

    #[test]
    fn test_closed_connection_maps_to_connection_failed() {
        let result = map_tokio_rusqlite_error(tokio_rusqlite::Error::ConnectionClosed, "Question");

        assert!(matches!(result, RepositoryError::ConnectionFailed(_)));
    }

    #[test]
    fn test_conversion_failure_maps_to_invalid_data() {
        let rusqlite_err = rusqlite::Error::InvalidColumnType(
            0,
            "id".to_string(),
            rusqlite::types::Type::Null,
        );
        let err = tokio_rusqlite::Error::Rusqlite(rusqlite_err);

        let result = map_tokio_rusqlite_error(err, "Question");

        assert!(matches!(result, RepositoryError::InvalidData(_)));
    }

    #[test]
    fn test_other_error_maps_to_query_failed() {
        let err = tokio_rusqlite::Error::Other(Box::new(std::io::Error::other("test error")));

        let result = map_tokio_rusqlite_error(err, "Answer");

        assert!(matches!(result, RepositoryError::QueryFailed(_)));
    }
}
