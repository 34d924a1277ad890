//! SQLite schema definitions and SQL query constants.
//!
//! This module contains the SQL statements used by the SQLite repository,
//! following the Functional Core pattern - pure data and pure SQL builders,
//! no I/O.

use quizbank_core::quiz::{QuestionFilter, QuestionOrder, QuestionQuery};
use rusqlite::types::Value;

/// SQL statement to create all tables.
///
/// Lookup references from `questions` use `ON DELETE RESTRICT`: removing a
/// category, difficulty, type or answer that a question still points at is
/// rejected. Link rows disappear with their question.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS difficulties (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS question_types (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS answers (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS questions (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL,
    category_id TEXT NOT NULL,
    difficulty_id TEXT NOT NULL,
    type_id TEXT NOT NULL,
    correct_answer_id TEXT NOT NULL,
    FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE RESTRICT,
    FOREIGN KEY (difficulty_id) REFERENCES difficulties(id) ON DELETE RESTRICT,
    FOREIGN KEY (type_id) REFERENCES question_types(id) ON DELETE RESTRICT,
    FOREIGN KEY (correct_answer_id) REFERENCES answers(id) ON DELETE RESTRICT
);

CREATE TABLE IF NOT EXISTS incorrect_answers (
    question_id TEXT NOT NULL,
    answer_id TEXT NOT NULL,
    PRIMARY KEY (question_id, answer_id),
    FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE,
    FOREIGN KEY (answer_id) REFERENCES answers(id) ON DELETE RESTRICT
);

CREATE INDEX IF NOT EXISTS idx_questions_category_id ON questions(category_id);
CREATE INDEX IF NOT EXISTS idx_questions_difficulty_id ON questions(difficulty_id);
CREATE INDEX IF NOT EXISTS idx_questions_type_id ON questions(type_id);
CREATE INDEX IF NOT EXISTS idx_questions_correct_answer_id ON questions(correct_answer_id);
CREATE INDEX IF NOT EXISTS idx_incorrect_answers_answer_id ON incorrect_answers(answer_id);
"#;

pub const ENABLE_FOREIGN_KEYS: &str = "PRAGMA foreign_keys = ON;";

// Seed statements
pub const INSERT_CATEGORY: &str = "INSERT INTO categories (id, name) VALUES (?1, ?2)";
pub const INSERT_DIFFICULTY: &str = "INSERT INTO difficulties (id, name) VALUES (?1, ?2)";
pub const INSERT_QUESTION_TYPE: &str = "INSERT INTO question_types (id, name) VALUES (?1, ?2)";
pub const INSERT_ANSWER: &str = "INSERT INTO answers (id, text) VALUES (?1, ?2)";

pub const INSERT_QUESTION: &str = r#"
INSERT INTO questions (id, text, category_id, difficulty_id, type_id, correct_answer_id)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub const INSERT_INCORRECT_ANSWER: &str =
    "INSERT INTO incorrect_answers (question_id, answer_id) VALUES (?1, ?2)";

/// Question columns joined with all four single-valued relations.
///
/// Row layout is what `conversions::row_to_question_details` expects.
const SELECT_QUESTION_DETAILS: &str = r#"
SELECT q.id, q.text,
       c.id, c.name,
       d.id, d.name,
       t.id, t.name,
       a.id, a.text
FROM questions q
INNER JOIN categories c ON c.id = q.category_id
INNER JOIN difficulties d ON d.id = q.difficulty_id
INNER JOIN question_types t ON t.id = q.type_id
INNER JOIN answers a ON a.id = q.correct_answer_id
"#;

pub const SELECT_QUESTION_BY_ID: &str = r#"
SELECT q.id, q.text,
       c.id, c.name,
       d.id, d.name,
       t.id, t.name,
       a.id, a.text
FROM questions q
INNER JOIN categories c ON c.id = q.category_id
INNER JOIN difficulties d ON d.id = q.difficulty_id
INNER JOIN question_types t ON t.id = q.type_id
INNER JOIN answers a ON a.id = q.correct_answer_id
WHERE q.id = ?1
"#;

pub const SELECT_ANSWER_OVERLAPS: &str = r#"
SELECT ia.question_id, ia.answer_id
FROM incorrect_answers ia
INNER JOIN questions q ON q.id = ia.question_id
WHERE q.correct_answer_id = ia.answer_id
ORDER BY ia.question_id ASC, ia.answer_id ASC
"#;

// Lookup queries
pub const SELECT_CATEGORIES: &str = "SELECT id, name FROM categories ORDER BY name ASC, id ASC";
pub const SELECT_DIFFICULTIES: &str =
    "SELECT id, name FROM difficulties ORDER BY name ASC, id ASC";
pub const SELECT_QUESTION_TYPES: &str =
    "SELECT id, name FROM question_types ORDER BY name ASC, id ASC";

pub const SELECT_CATEGORY_QUESTION_COUNTS: &str = r#"
SELECT c.id, c.name, COUNT(q.id)
FROM categories c
LEFT JOIN questions q ON q.category_id = c.id
GROUP BY c.id, c.name
ORDER BY c.name ASC, c.id ASC
"#;

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Builds the `WHERE` clause for a filter. Parameters are numbered from
/// `?1`.
fn where_clause(filter: &QuestionFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    let columns = [
        ("q.category_id", filter.category_id.as_ref().map(|id| id.as_str())),
        ("q.difficulty_id", filter.difficulty_id.as_ref().map(|id| id.as_str())),
        ("q.type_id", filter.type_id.as_ref().map(|id| id.as_str())),
    ];
    for (column, value) in columns {
        if let Some(value) = value {
            params.push(Value::Text(value.to_string()));
            conditions.push(format!("{column} = ?{}", params.len()));
        }
    }

    if conditions.is_empty() {
        (String::new(), params)
    } else {
        (format!("WHERE {}\n", conditions.join(" AND ")), params)
    }
}

fn order_clause(order: QuestionOrder) -> &'static str {
    match order {
        QuestionOrder::IdAsc => "ORDER BY q.id ASC\n",
        QuestionOrder::IdDesc => "ORDER BY q.id DESC\n",
        QuestionOrder::TextAsc => "ORDER BY q.text ASC, q.id ASC\n",
    }
}

/// Builds the count statement for a filter.
pub fn count_questions(filter: &QuestionFilter) -> Statement {
    let (where_sql, params) = where_clause(filter);
    Statement {
        sql: format!("SELECT COUNT(*) FROM questions q\n{where_sql}"),
        params,
    }
}

/// Builds the joined, ordered and sliced fetch statement for a query.
///
/// Without a limit SQLite still needs a `LIMIT` before `OFFSET`, so `-1`
/// (no limit) is used.
pub fn fetch_questions(query: &QuestionQuery) -> Statement {
    let (where_sql, mut params) = where_clause(query.filter_ref());
    let limit = query
        .limit()
        .map(|limit| i64::try_from(limit).unwrap_or(i64::MAX))
        .unwrap_or(-1);
    let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);

    params.push(Value::Integer(limit));
    let limit_idx = params.len();
    params.push(Value::Integer(offset));
    let offset_idx = params.len();

    Statement {
        sql: format!(
            "{SELECT_QUESTION_DETAILS}{where_sql}{}LIMIT ?{limit_idx} OFFSET ?{offset_idx}",
            order_clause(query.order())
        ),
        params,
    }
}

/// Builds one batched read of the incorrect answers for a set of questions.
///
/// Returns `None` when there is nothing to look up.
pub fn incorrect_answers_for(question_ids: &[&str]) -> Option<Statement> {
    if question_ids.is_empty() {
        return None;
    }
    let placeholders: Vec<String> = (1..=question_ids.len()).map(|i| format!("?{i}")).collect();
    Some(Statement {
        sql: format!(
            "SELECT ia.question_id, a.id, a.text\n\
             FROM incorrect_answers ia\n\
             INNER JOIN answers a ON a.id = ia.answer_id\n\
             WHERE ia.question_id IN ({})\n\
             ORDER BY ia.question_id ASC, a.text ASC, a.id ASC",
            placeholders.join(", ")
        ),
        params: question_ids
            .iter()
            .map(|id| Value::Text((*id).to_string()))
            .collect(),
    })
}
