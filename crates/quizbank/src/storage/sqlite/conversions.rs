//! SQLite row conversion functions.
//!
//! Pure functions for converting SQLite rows into domain types.

use std::collections::HashMap;

use quizbank_core::quiz::{
    Answer, AnswerOverlap, Category, Difficulty, QuestionDetails, QuestionType,
};
use rusqlite::Row;

/// Convert a joined row to a QuestionDetails without incorrect answers.
///
/// Expected columns: q.id, q.text, c.id, c.name, d.id, d.name, t.id, t.name, a.id, a.text
pub fn row_to_question_details(row: &Row) -> rusqlite::Result<QuestionDetails> {
    let id: String = row.get(0)?;
    let text: String = row.get(1)?;
    let category_id: String = row.get(2)?;
    let category_name: String = row.get(3)?;
    let difficulty_id: String = row.get(4)?;
    let difficulty_name: String = row.get(5)?;
    let type_id: String = row.get(6)?;
    let type_name: String = row.get(7)?;
    let answer_id: String = row.get(8)?;
    let answer_text: String = row.get(9)?;

    Ok(QuestionDetails {
        id: id.into(),
        text,
        category: Category::new(category_id, category_name),
        difficulty: Difficulty::new(difficulty_id, difficulty_name),
        question_type: QuestionType::new(type_id, type_name),
        correct_answer: Answer::new(answer_id, answer_text),
        incorrect_answers: Vec::new(),
    })
}

/// Convert a row to a (question id, incorrect answer) pair.
///
/// Expected columns: question_id, answer id, answer text
pub fn row_to_incorrect_answer(row: &Row) -> rusqlite::Result<(String, Answer)> {
    let question_id: String = row.get(0)?;
    let answer_id: String = row.get(1)?;
    let answer_text: String = row.get(2)?;

    Ok((question_id, Answer::new(answer_id, answer_text)))
}

/// Expected columns: question_id, answer_id
pub fn row_to_answer_overlap(row: &Row) -> rusqlite::Result<AnswerOverlap> {
    let question_id: String = row.get(0)?;
    let answer_id: String = row.get(1)?;

    Ok(AnswerOverlap {
        question_id: question_id.into(),
        answer_id: answer_id.into(),
    })
}

/// Expected columns: id, name
pub fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    Ok(Category::new(id, name))
}

/// Expected columns: id, name
pub fn row_to_difficulty(row: &Row) -> rusqlite::Result<Difficulty> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    Ok(Difficulty::new(id, name))
}

/// Expected columns: id, name
pub fn row_to_question_type(row: &Row) -> rusqlite::Result<QuestionType> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    Ok(QuestionType::new(id, name))
}

/// Convert a row to a category with its question count.
///
/// Expected columns: id, name, count
pub fn row_to_category_count(row: &Row) -> rusqlite::Result<(Category, u64)> {
    let category = row_to_category(row)?;
    let count: i64 = row.get(2)?;
    let count = u64::try_from(count).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Integer, Box::new(e))
    })?;
    Ok((category, count))
}

/// Converts a `COUNT(*)` result, which SQLite reports as a signed integer.
pub fn count_from_sql(count: i64) -> rusqlite::Result<u64> {
    u64::try_from(count).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Integer, Box::new(e))
    })
}

/// Attaches batched incorrect answers to their questions, keeping the
/// question order intact.
pub fn attach_incorrect_answers(
    questions: &mut [QuestionDetails],
    incorrect: Vec<(String, Answer)>,
) {
    let mut by_question: HashMap<String, Vec<Answer>> = HashMap::new();
    for (question_id, answer) in incorrect {
        by_question.entry(question_id).or_default().push(answer);
    }
    for question in questions {
        if let Some(answers) = by_question.remove(question.id.as_str()) {
            question.incorrect_answers = answers;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_row_to_question_details() {
        let conn = Connection::open_in_memory().unwrap();
        let details = conn
            .query_row(
                "SELECT 'q-1', 'Capital of Peru?', 'c-1', 'Geography', 'd-1', 'easy', \
                 't-1', 'multiple', 'a-1', 'Lima'",
                [],
                row_to_question_details,
            )
            .unwrap();

        assert_eq!(details.id.as_str(), "q-1");
        assert_eq!(details.text, "Capital of Peru?");
        assert_eq!(details.category, Category::new("c-1", "Geography"));
        assert_eq!(details.difficulty, Difficulty::new("d-1", "easy"));
        assert_eq!(details.question_type, QuestionType::new("t-1", "multiple"));
        assert_eq!(details.correct_answer, Answer::new("a-1", "Lima"));
        assert!(details.incorrect_answers.is_empty());
    }

    #[test]
    fn test_row_to_category_count() {
        let conn = Connection::open_in_memory().unwrap();
        let (category, count) = conn
            .query_row("SELECT 'c-1', 'History', 7", [], row_to_category_count)
            .unwrap();

        assert_eq!(category.name, "History");
        assert_eq!(count, 7);
    }

    #[test]
    fn test_negative_count_is_rejected() {
        assert!(count_from_sql(-1).is_err());
        assert_eq!(count_from_sql(42).unwrap(), 42);
    }

    #[test]
    fn test_attach_incorrect_answers_groups_by_question() {
        let conn = Connection::open_in_memory().unwrap();
        let make = |id: &str| {
            conn.query_row(
                &format!("SELECT '{id}', 'text', 'c', 'C', 'd', 'D', 't', 'T', 'a', 'A'"),
                [],
                row_to_question_details,
            )
            .unwrap()
        };
        let mut questions = vec![make("q-1"), make("q-2")];

        attach_incorrect_answers(
            &mut questions,
            vec![
                ("q-2".to_string(), Answer::new("a-3", "Three")),
                ("q-1".to_string(), Answer::new("a-1", "One")),
                ("q-2".to_string(), Answer::new("a-4", "Four")),
            ],
        );

        assert_eq!(questions[0].id.as_str(), "q-1");
        assert_eq!(questions[0].incorrect_answers, vec![Answer::new("a-1", "One")]);
        assert_eq!(
            questions[1].incorrect_answers,
            vec![Answer::new("a-3", "Three"), Answer::new("a-4", "Four")]
        );
    }
}
