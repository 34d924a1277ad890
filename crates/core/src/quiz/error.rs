use thiserror::Error;

/// Problems found while validating a [`super::QuizDataset`] before import.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatasetError {
    #[error("Duplicate {entity_type} id: {id}")]
    DuplicateId {
        entity_type: &'static str,
        id: String,
    },
    #[error("Duplicate {entity_type} label: {label}")]
    DuplicateLabel {
        entity_type: &'static str,
        label: String,
    },
    #[error("Question {question_id} references missing {entity_type} {id}")]
    DanglingReference {
        question_id: String,
        entity_type: &'static str,
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_error_display() {
        assert_eq!(
            DatasetError::DuplicateLabel {
                entity_type: "Category",
                label: "History".to_string(),
            }
            .to_string(),
            "Duplicate Category label: History"
        );
        assert_eq!(
            DatasetError::DanglingReference {
                question_id: "q-1".to_string(),
                entity_type: "Answer",
                id: "a-404".to_string(),
            }
            .to_string(),
            "Question q-1 references missing Answer a-404"
        );
    }
}
