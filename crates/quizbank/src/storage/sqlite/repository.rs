//! SQLite repository implementation.
//!
//! Implements the repository traits from `quizbank_core::storage` using SQLite.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rusqlite::OpenFlags;
use tokio_rusqlite::Connection;

use quizbank_core::quiz::{
    AnswerOverlap, Category, Difficulty, QuestionDetails, QuestionFilter, QuestionId,
    QuestionQuery, QuestionType, QuizDataset,
};
use quizbank_core::storage::{LookupRepository, QuestionRepository, RepositoryError, Result};

use super::conversions::{
    attach_incorrect_answers, count_from_sql, row_to_answer_overlap, row_to_category,
    row_to_category_count, row_to_difficulty, row_to_incorrect_answer, row_to_question_details,
    row_to_question_type,
};
use super::error::map_tokio_rusqlite_error;
use super::schema::{self, Statement};

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// Runs a parameterless query and collects every row.
fn query_all<T, F>(conn: &rusqlite::Connection, sql: &str, f: F) -> rusqlite::Result<Vec<T>>
where
    F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], f)?;
    rows.collect()
}

/// Loads the incorrect answers of `questions` in one batched read.
fn load_incorrect_answers(
    conn: &rusqlite::Connection,
    questions: &mut [QuestionDetails],
) -> rusqlite::Result<()> {
    let ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
    let Some(Statement { sql, params }) = schema::incorrect_answers_for(&ids) else {
        return Ok(());
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        rusqlite::params_from_iter(params.iter()),
        row_to_incorrect_answer,
    )?;

    let mut incorrect = Vec::new();
    for row_result in rows {
        incorrect.push(row_result?);
    }
    attach_incorrect_answers(questions, incorrect);
    Ok(())
}

/// Upper bound on read-only connections opened by
/// [`SqliteRepository::open_read_only`].
const MAX_READ_CONNECTIONS: usize = 8;

/// SQLite-based repository implementation.
///
/// Every operation runs as a single `call` on one connection's worker
/// thread; nothing is held between calls. Read-only handles spread calls
/// round-robin over several connections so requests run in parallel.
pub struct SqliteRepository {
    conns: Vec<Connection>,
    next: AtomicUsize,
}

impl SqliteRepository {
    fn from_connections(conns: Vec<Connection>) -> Self {
        Self {
            conns,
            next: AtomicUsize::new(0),
        }
    }

    /// Picks the connection for the next call.
    fn conn(&self) -> &Connection {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.conns.len();
        &self.conns[index]
    }

    /// Opens (or creates) a database file for reading and writing.
    ///
    /// Foreign keys are enforced and schema tables are created
    /// automatically. Used by the seed path; the server reads through
    /// [`SqliteRepository::open_read_only`].
    pub async fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self::from_connections(vec![conn]))
    }

    /// Opens an existing, pre-populated database without write access.
    ///
    /// One connection per available core, up to [`MAX_READ_CONNECTIONS`].
    /// Fails with `ConnectionFailed` if the file does not exist.
    pub async fn open_read_only(path: &str) -> Result<Self> {
        let connections = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(4)
            .min(MAX_READ_CONNECTIONS);
        Self::open_read_only_with(path, connections).await
    }

    /// Opens `connections` read-only connections (at least one) to `path`.
    pub async fn open_read_only_with(path: &str, connections: usize) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let mut conns = Vec::with_capacity(connections.max(1));
        for _ in 0..connections.max(1) {
            let conn = Connection::open_with_flags(path, flags)
                .await
                .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;
            conns.push(conn);
        }

        tracing::debug!(path, connections = conns.len(), "Opened read-only connections");
        Ok(Self::from_connections(conns))
    }

    /// Creates a new repository with an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self::from_connections(vec![conn]))
    }

    /// Initialize the database schema.
    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::ENABLE_FOREIGN_KEYS)
                .map_err(wrap_err)?;
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }

    /// Imports a whole dataset in one transaction.
    ///
    /// This is the out-of-band seed path. The dataset is validated first;
    /// constraint violations raised by SQLite (for example rows that already
    /// exist) roll the whole import back.
    pub async fn import_dataset(&self, dataset: &QuizDataset) -> Result<()> {
        dataset.validate()?;
        let dataset = dataset.clone();
        let question_count = dataset.questions.len();

        self.conn()
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                {
                    let mut insert = tx
                        .prepare_cached(schema::INSERT_CATEGORY)
                        .map_err(wrap_err)?;
                    for category in &dataset.categories {
                        insert
                            .execute([category.id.as_str(), category.name.as_str()])
                            .map_err(wrap_err)?;
                    }

                    let mut insert = tx
                        .prepare_cached(schema::INSERT_DIFFICULTY)
                        .map_err(wrap_err)?;
                    for difficulty in &dataset.difficulties {
                        insert
                            .execute([difficulty.id.as_str(), difficulty.name.as_str()])
                            .map_err(wrap_err)?;
                    }

                    let mut insert = tx
                        .prepare_cached(schema::INSERT_QUESTION_TYPE)
                        .map_err(wrap_err)?;
                    for question_type in &dataset.question_types {
                        insert
                            .execute([question_type.id.as_str(), question_type.name.as_str()])
                            .map_err(wrap_err)?;
                    }

                    let mut insert = tx.prepare_cached(schema::INSERT_ANSWER).map_err(wrap_err)?;
                    for answer in &dataset.answers {
                        insert
                            .execute([answer.id.as_str(), answer.text.as_str()])
                            .map_err(wrap_err)?;
                    }

                    let mut insert = tx
                        .prepare_cached(schema::INSERT_QUESTION)
                        .map_err(wrap_err)?;
                    for question in &dataset.questions {
                        insert
                            .execute([
                                question.id.as_str(),
                                question.text.as_str(),
                                question.category_id.as_str(),
                                question.difficulty_id.as_str(),
                                question.type_id.as_str(),
                                question.correct_answer_id.as_str(),
                            ])
                            .map_err(wrap_err)?;
                    }

                    let mut insert = tx
                        .prepare_cached(schema::INSERT_INCORRECT_ANSWER)
                        .map_err(wrap_err)?;
                    for link in &dataset.incorrect_answers {
                        insert
                            .execute([link.question_id.as_str(), link.answer_id.as_str()])
                            .map_err(wrap_err)?;
                    }
                }
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "QuizDataset"))?;

        tracing::info!(questions = question_count, "Imported quiz dataset");
        Ok(())
    }
}

// ============================================================================
// QuestionRepository implementation
// ============================================================================

#[async_trait]
impl QuestionRepository for SqliteRepository {
    async fn count_questions(&self, filter: &QuestionFilter) -> Result<u64> {
        let Statement { sql, params } = schema::count_questions(filter);

        self.conn()
            .call(move |conn| {
                let count: i64 = conn
                    .query_row(&sql, rusqlite::params_from_iter(params.iter()), |row| {
                        row.get(0)
                    })
                    .map_err(wrap_err)?;
                count_from_sql(count).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Question"))
    }

    async fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<QuestionDetails>> {
        let Statement { sql, params } = schema::fetch_questions(query);
        let with_incorrect_answers = query.includes_incorrect_answers();

        self.conn()
            .call(move |conn| {
                let mut questions = {
                    let mut stmt = conn.prepare(&sql).map_err(wrap_err)?;
                    let rows = stmt
                        .query_map(
                            rusqlite::params_from_iter(params.iter()),
                            row_to_question_details,
                        )
                        .map_err(wrap_err)?;

                    let mut questions = Vec::new();
                    for row_result in rows {
                        questions.push(row_result.map_err(wrap_err)?);
                    }
                    questions
                };

                if with_incorrect_answers {
                    load_incorrect_answers(conn, &mut questions).map_err(wrap_err)?;
                }
                Ok(questions)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Question"))
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Option<QuestionDetails>> {
        let id_str = id.to_string();

        self.conn()
            .call(move |conn| {
                let found = {
                    let mut stmt = conn
                        .prepare(schema::SELECT_QUESTION_BY_ID)
                        .map_err(wrap_err)?;
                    match stmt.query_row([&id_str], row_to_question_details) {
                        Ok(question) => Some(question),
                        Err(rusqlite::Error::QueryReturnedNoRows) => None,
                        Err(e) => return Err(wrap_err(e)),
                    }
                };

                match found {
                    Some(question) => {
                        let mut questions = [question];
                        load_incorrect_answers(conn, &mut questions).map_err(wrap_err)?;
                        let [question] = questions;
                        Ok(Some(question))
                    }
                    None => Ok(None),
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Question"))
    }

    async fn find_answer_overlaps(&self) -> Result<Vec<AnswerOverlap>> {
        self.conn()
            .call(|conn| {
                query_all(conn, schema::SELECT_ANSWER_OVERLAPS, row_to_answer_overlap)
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "IncorrectAnswerLink"))
    }
}

// ============================================================================
// LookupRepository implementation
// ============================================================================

#[async_trait]
impl LookupRepository for SqliteRepository {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.conn()
            .call(|conn| {
                query_all(conn, schema::SELECT_CATEGORIES, row_to_category).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Category"))
    }

    async fn list_difficulties(&self) -> Result<Vec<Difficulty>> {
        self.conn()
            .call(|conn| {
                query_all(conn, schema::SELECT_DIFFICULTIES, row_to_difficulty).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Difficulty"))
    }

    async fn list_question_types(&self) -> Result<Vec<QuestionType>> {
        self.conn()
            .call(|conn| {
                query_all(conn, schema::SELECT_QUESTION_TYPES, row_to_question_type)
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "QuestionType"))
    }

    async fn category_question_counts(&self) -> Result<Vec<(Category, u64)>> {
        self.conn()
            .call(|conn| {
                query_all(
                    conn,
                    schema::SELECT_CATEGORY_QUESTION_COUNTS,
                    row_to_category_count,
                )
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Category"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizbank_core::quiz::{
        generate_demo_dataset, IncorrectAnswerLink, PageRequest, Question, QuestionOrder,
    };

    async fn seeded(count: u32) -> (SqliteRepository, QuizDataset) {
        let repo = SqliteRepository::new_in_memory().await.unwrap();
        let dataset = generate_demo_dataset(count);
        repo.import_dataset(&dataset).await.unwrap();
        (repo, dataset)
    }

    fn sorted_ids(dataset: &QuizDataset) -> Vec<String> {
        let mut ids: Vec<String> = dataset.questions.iter().map(|q| q.id.to_string()).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_count_on_empty_database() {
        let repo = SqliteRepository::new_in_memory().await.unwrap();

        assert_eq!(repo.count_questions(&QuestionFilter::all()).await.unwrap(), 0);
        assert!(repo
            .fetch_questions(&QuestionQuery::new())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_fetch_orders_by_id_and_slices() {
        let (repo, dataset) = seeded(30).await;
        let expected = sorted_ids(&dataset);

        let first = repo
            .fetch_questions(&QuestionQuery::new().page(PageRequest::new(1, 25)))
            .await
            .unwrap();
        let second = repo
            .fetch_questions(&QuestionQuery::new().page(PageRequest::new(2, 25)))
            .await
            .unwrap();

        assert_eq!(first.len(), 25);
        assert_eq!(second.len(), 5);
        let ids: Vec<String> = first
            .iter()
            .chain(second.iter())
            .map(|q| q.id.to_string())
            .collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_fetch_hydrates_relations() {
        let (repo, dataset) = seeded(9).await;

        let questions = repo.fetch_questions(&QuestionQuery::new()).await.unwrap();

        assert_eq!(questions.len(), 9);
        for details in &questions {
            let stored = dataset
                .questions
                .iter()
                .find(|q| q.id == details.id)
                .unwrap();
            assert_eq!(details.text, stored.text);
            assert_eq!(details.category.id, stored.category_id);
            assert_eq!(details.difficulty.id, stored.difficulty_id);
            assert_eq!(details.question_type.id, stored.type_id);
            assert_eq!(details.correct_answer.id, stored.correct_answer_id);
            assert!(details.incorrect_answers.is_empty());
        }
    }

    #[tokio::test]
    async fn test_fetch_with_incorrect_answers() {
        let (repo, dataset) = seeded(6).await;
        let index = dataset.incorrect_answer_index();

        let questions = repo
            .fetch_questions(&QuestionQuery::new().with_incorrect_answers())
            .await
            .unwrap();

        for details in &questions {
            let mut expected = index[&details.id].clone();
            expected.sort();
            let mut actual: Vec<_> = details
                .incorrect_answers
                .iter()
                .map(|a| a.id.clone())
                .collect();
            actual.sort();
            assert_eq!(actual, expected);
        }
    }

    #[tokio::test]
    async fn test_filters_and_text_order() {
        let (repo, dataset) = seeded(20).await;
        let category = dataset.categories[0].id.clone();
        let expected = dataset
            .questions
            .iter()
            .filter(|q| q.category_id == category)
            .count() as u64;

        let filter = QuestionFilter {
            category_id: Some(category.clone()),
            ..QuestionFilter::default()
        };
        assert_eq!(repo.count_questions(&filter).await.unwrap(), expected);

        let questions = repo
            .fetch_questions(
                &QuestionQuery::new()
                    .in_category(category.clone())
                    .order_by(QuestionOrder::TextAsc),
            )
            .await
            .unwrap();
        assert_eq!(questions.len() as u64, expected);
        assert!(questions.iter().all(|q| q.category.id == category));
        assert!(questions.windows(2).all(|w| w[0].text <= w[1].text));
    }

    #[tokio::test]
    async fn test_get_question() {
        let (repo, dataset) = seeded(4).await;
        let stored = &dataset.questions[0];

        let details = repo.get_question(&stored.id).await.unwrap().unwrap();

        assert_eq!(details.id, stored.id);
        assert_eq!(details.incorrect_answers.len(), 3);
        assert!(repo
            .get_question(&QuestionId::new("missing"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_lookups_are_sorted_by_name() {
        let (repo, _) = seeded(10).await;

        let categories = repo.list_categories().await.unwrap();
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "General Knowledge",
                "Geography",
                "History",
                "Science & Nature",
                "Sports"
            ]
        );

        let difficulties = repo.list_difficulties().await.unwrap();
        assert_eq!(difficulties.len(), 3);
        assert_eq!(difficulties[0].name, "easy");

        let types = repo.list_question_types().await.unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].name, "boolean");
    }

    #[tokio::test]
    async fn test_category_question_counts_include_empty_categories() {
        let (repo, _) = seeded(3).await;

        let counts = repo.category_question_counts().await.unwrap();

        assert_eq!(counts.len(), 5);
        assert_eq!(counts.iter().map(|(_, n)| n).sum::<u64>(), 3);
        assert!(counts.iter().any(|(_, n)| *n == 0));
    }

    #[tokio::test]
    async fn test_overlaps_are_found() {
        let repo = SqliteRepository::new_in_memory().await.unwrap();
        let mut dataset = generate_demo_dataset(1);
        let question = dataset.questions[0].clone();
        dataset.incorrect_answers.push(IncorrectAnswerLink::new(
            question.id.clone(),
            question.correct_answer_id.clone(),
        ));
        repo.import_dataset(&dataset).await.unwrap();

        let overlaps = repo.find_answer_overlaps().await.unwrap();

        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].question_id, question.id);
    }

    #[tokio::test]
    async fn test_import_rejects_dangling_reference() {
        let repo = SqliteRepository::new_in_memory().await.unwrap();
        let mut dataset = generate_demo_dataset(2);
        dataset.questions.push(Question::new(
            "q-orphan",
            "Orphan?",
            "c-missing",
            dataset.difficulties[0].id.clone(),
            dataset.question_types[0].id.clone(),
            dataset.answers[0].id.clone(),
        ));

        let result = repo.import_dataset(&dataset).await;

        assert!(matches!(result, Err(RepositoryError::IntegrityViolation(_))));
        assert_eq!(repo.count_questions(&QuestionFilter::all()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_second_import_rolls_back() {
        let (repo, dataset) = seeded(5).await;

        let result = repo.import_dataset(&dataset).await;

        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
        assert_eq!(repo.count_questions(&QuestionFilter::all()).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_deleting_referenced_lookup_is_restricted() {
        let (repo, dataset) = seeded(5).await;
        let category_id = dataset.categories[0].id.to_string();

        let result = repo
            .conn()
            .call(move |conn| {
                conn.execute("DELETE FROM categories WHERE id = ?1", [&category_id])
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Category"));

        assert!(matches!(result, Err(RepositoryError::IntegrityViolation(_))));
        assert_eq!(repo.list_categories().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_duplicate_answer_text_is_rejected_by_schema() {
        let repo = SqliteRepository::new_in_memory().await.unwrap();

        let result = repo
            .conn()
            .call(|conn| {
                conn.execute_batch(
                    "INSERT INTO answers (id, text) VALUES ('a-1', 'Paris');
                     INSERT INTO answers (id, text) VALUES ('a-2', 'Paris');",
                )
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Answer"));

        assert!(matches!(
            result,
            Err(RepositoryError::AlreadyExists {
                entity_type: "Answer",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_read_only_handle_reads_seeded_file() {
        let path = std::env::temp_dir().join(format!(
            "quizbank-read-only-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let path_str = path.to_string_lossy().to_string();

        {
            let writer = SqliteRepository::open(&path_str).await.unwrap();
            writer
                .import_dataset(&generate_demo_dataset(12))
                .await
                .unwrap();
        }

        let reader = SqliteRepository::open_read_only(&path_str).await.unwrap();
        assert_eq!(reader.count_questions(&QuestionFilter::all()).await.unwrap(), 12);

        let result = reader.import_dataset(&generate_demo_dataset(0)).await;
        assert!(result.is_err());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_read_only_connections_serve_parallel_reads() {
        let path = std::env::temp_dir().join(format!(
            "quizbank-read-pool-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let path_str = path.to_string_lossy().to_string();

        {
            let writer = SqliteRepository::open(&path_str).await.unwrap();
            writer
                .import_dataset(&generate_demo_dataset(30))
                .await
                .unwrap();
        }

        let reader = SqliteRepository::open_read_only_with(&path_str, 3)
            .await
            .unwrap();
        assert_eq!(reader.conns.len(), 3);

        let query = QuestionQuery::new().page(PageRequest::new(2, 25));
        let all = QuestionFilter::all();
        let (a, b, c, d) = tokio::join!(
            reader.count_questions(&all),
            reader.fetch_questions(&query),
            reader.count_questions(&all),
            reader.fetch_questions(&query),
        );
        assert_eq!(a.unwrap(), 30);
        assert_eq!(c.unwrap(), 30);
        assert_eq!(b.unwrap(), d.unwrap());

        let single = SqliteRepository::open_read_only_with(&path_str, 0)
            .await
            .unwrap();
        assert_eq!(single.conns.len(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_read_only_open_of_missing_file_fails() {
        let result = SqliteRepository::open_read_only("/nonexistent/dir/quizbank.db").await;

        assert!(matches!(result, Err(RepositoryError::ConnectionFailed(_))));
    }
}
