//! In-memory repository implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use quizbank_core::quiz::{
    find_answer_overlaps, Answer, AnswerId, AnswerOverlap, Category, CategoryId, Difficulty,
    DifficultyId, Question, QuestionDetails, QuestionFilter, QuestionId, QuestionOrder,
    QuestionQuery, QuestionType, QuizDataset, TypeId,
};
use quizbank_core::storage::{LookupRepository, QuestionRepository, RepositoryError, Result};

/// Indexed copy of a dataset.
#[derive(Debug, Default)]
struct Tables {
    categories: HashMap<CategoryId, Category>,
    difficulties: HashMap<DifficultyId, Difficulty>,
    question_types: HashMap<TypeId, QuestionType>,
    answers: HashMap<AnswerId, Answer>,
    /// Keyed by id, so iteration is already in id order.
    questions: BTreeMap<QuestionId, Question>,
    incorrect_answers: BTreeMap<QuestionId, Vec<AnswerId>>,
    dataset: QuizDataset,
}

impl Tables {
    fn from_dataset(dataset: QuizDataset) -> Self {
        Self {
            categories: index_by(&dataset.categories, |c| c.id.clone()),
            difficulties: index_by(&dataset.difficulties, |d| d.id.clone()),
            question_types: index_by(&dataset.question_types, |t| t.id.clone()),
            answers: index_by(&dataset.answers, |a| a.id.clone()),
            questions: dataset
                .questions
                .iter()
                .map(|q| (q.id.clone(), q.clone()))
                .collect(),
            incorrect_answers: dataset.incorrect_answer_index(),
            dataset,
        }
    }

    /// Joins a question with its relations. A missing relation means the
    /// stored data is corrupt.
    fn hydrate(&self, question: &Question, with_incorrect: bool) -> Result<QuestionDetails> {
        let category = lookup(&self.categories, &question.category_id, "Category")?;
        let difficulty = lookup(&self.difficulties, &question.difficulty_id, "Difficulty")?;
        let question_type = lookup(&self.question_types, &question.type_id, "QuestionType")?;
        let correct_answer = lookup(&self.answers, &question.correct_answer_id, "Answer")?;

        let mut incorrect_answers = Vec::new();
        if with_incorrect {
            for answer_id in self
                .incorrect_answers
                .get(&question.id)
                .into_iter()
                .flatten()
            {
                incorrect_answers.push(lookup(&self.answers, answer_id, "Answer")?);
            }
            incorrect_answers.sort_by(|a, b| a.text.cmp(&b.text).then_with(|| a.id.cmp(&b.id)));
        }

        Ok(QuestionDetails {
            id: question.id.clone(),
            text: question.text.clone(),
            category,
            difficulty,
            question_type,
            correct_answer,
            incorrect_answers,
        })
    }

    fn matching<'a>(&'a self, filter: &'a QuestionFilter) -> impl Iterator<Item = &'a Question> {
        self.questions.values().filter(move |q| filter.matches(q))
    }
}

fn index_by<K, V>(items: &[V], key: impl Fn(&V) -> K) -> HashMap<K, V>
where
    K: std::hash::Hash + Eq,
    V: Clone,
{
    items.iter().map(|item| (key(item), item.clone())).collect()
}

fn lookup<K, V>(table: &HashMap<K, V>, id: &K, entity_type: &'static str) -> Result<V>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
    V: Clone,
{
    table
        .get(id)
        .cloned()
        .ok_or_else(|| RepositoryError::InvalidData(format!("Missing {entity_type} {id}")))
}

fn sorted_by_name<T: Clone>(items: &[T], name: impl Fn(&T) -> (&str, &str)) -> Vec<T> {
    let mut items = items.to_vec();
    items.sort_by(|a, b| name(a).cmp(&name(b)));
    items
}

/// In-memory storage backend.
///
/// Holds one validated dataset behind `Arc<RwLock<_>>`. Readers never block
/// each other.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository serving the given dataset.
    ///
    /// Fails if the dataset breaks id/label uniqueness or referential
    /// integrity.
    pub fn with_dataset(dataset: QuizDataset) -> Result<Self> {
        dataset.validate()?;
        Ok(Self {
            tables: Arc::new(RwLock::new(Tables::from_dataset(dataset))),
        })
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn count_questions(&self, filter: &QuestionFilter) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables.matching(filter).count() as u64)
    }

    async fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<QuestionDetails>> {
        let tables = self.tables.read().await;

        let mut selected: Vec<&Question> = tables.matching(query.filter_ref()).collect();
        match query.order() {
            QuestionOrder::IdAsc => {}
            QuestionOrder::IdDesc => selected.reverse(),
            QuestionOrder::TextAsc => {
                selected.sort_by(|a, b| a.text.cmp(&b.text).then_with(|| a.id.cmp(&b.id)))
            }
        }

        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let limit = query
            .limit()
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        selected
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|q| tables.hydrate(q, query.includes_incorrect_answers()))
            .collect()
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Option<QuestionDetails>> {
        let tables = self.tables.read().await;
        tables
            .questions
            .get(id)
            .map(|q| tables.hydrate(q, true))
            .transpose()
    }

    async fn find_answer_overlaps(&self) -> Result<Vec<AnswerOverlap>> {
        let tables = self.tables.read().await;
        Ok(find_answer_overlaps(
            &tables.dataset.questions,
            &tables.dataset.incorrect_answers,
        ))
    }
}

#[async_trait]
impl LookupRepository for InMemoryRepository {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_name(&tables.dataset.categories, |c| {
            (c.name.as_str(), c.id.as_str())
        }))
    }

    async fn list_difficulties(&self) -> Result<Vec<Difficulty>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_name(&tables.dataset.difficulties, |d| {
            (d.name.as_str(), d.id.as_str())
        }))
    }

    async fn list_question_types(&self) -> Result<Vec<QuestionType>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_name(&tables.dataset.question_types, |t| {
            (t.name.as_str(), t.id.as_str())
        }))
    }

    async fn category_question_counts(&self) -> Result<Vec<(Category, u64)>> {
        let tables = self.tables.read().await;
        let mut counts: HashMap<&CategoryId, u64> = HashMap::new();
        for question in tables.questions.values() {
            *counts.entry(&question.category_id).or_default() += 1;
        }

        Ok(sorted_by_name(&tables.dataset.categories, |c| {
            (c.name.as_str(), c.id.as_str())
        })
        .into_iter()
        .map(|category| {
            let count = counts.get(&category.id).copied().unwrap_or(0);
            (category, count)
        })
        .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizbank_core::quiz::{generate_demo_dataset, IncorrectAnswerLink, PageRequest};

    fn seeded(count: u32) -> (InMemoryRepository, QuizDataset) {
        let dataset = generate_demo_dataset(count);
        let repo = InMemoryRepository::with_dataset(dataset.clone()).unwrap();
        (repo, dataset)
    }

    #[tokio::test]
    async fn test_empty_repository() {
        let repo = InMemoryRepository::new();

        assert_eq!(repo.count_questions(&QuestionFilter::all()).await.unwrap(), 0);
        assert!(repo
            .fetch_questions(&QuestionQuery::new())
            .await
            .unwrap()
            .is_empty());
        assert!(repo.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_orders_by_id_and_slices() {
        let (repo, dataset) = seeded(30);
        let mut expected: Vec<QuestionId> =
            dataset.questions.iter().map(|q| q.id.clone()).collect();
        expected.sort();

        let page = repo
            .fetch_questions(&QuestionQuery::new().page(PageRequest::new(2, 25)))
            .await
            .unwrap();

        assert_eq!(page.len(), 5);
        let ids: Vec<QuestionId> = page.into_iter().map(|q| q.id).collect();
        assert_eq!(ids, expected[25..].to_vec());
    }

    #[tokio::test]
    async fn test_id_desc_order() {
        let (repo, _) = seeded(8);

        let questions = repo
            .fetch_questions(&QuestionQuery::new().order_by(QuestionOrder::IdDesc))
            .await
            .unwrap();

        assert!(questions.windows(2).all(|w| w[0].id > w[1].id));
    }

    #[tokio::test]
    async fn test_get_question_includes_incorrect_answers() {
        let (repo, dataset) = seeded(3);
        let boolean = &dataset.questions[2];

        let details = repo.get_question(&boolean.id).await.unwrap().unwrap();

        assert_eq!(details.incorrect_answers.len(), 1);
        assert_ne!(details.incorrect_answers[0].id, details.correct_answer.id);
        assert!(repo
            .get_question(&QuestionId::new("missing"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_invalid_dataset_is_rejected() {
        let mut dataset = generate_demo_dataset(2);
        dataset.questions[0].type_id = "t-missing".into();

        let result = InMemoryRepository::with_dataset(dataset);

        assert!(matches!(result, Err(RepositoryError::IntegrityViolation(_))));
    }

    #[tokio::test]
    async fn test_with_dataset_serves_lookups() {
        let (repo, _) = seeded(4);

        assert_eq!(repo.count_questions(&QuestionFilter::all()).await.unwrap(), 4);
        assert_eq!(repo.list_difficulties().await.unwrap().len(), 3);
        assert_eq!(repo.list_question_types().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_overlaps_and_counts() {
        let mut dataset = generate_demo_dataset(5);
        let question = dataset.questions[1].clone();
        dataset.incorrect_answers.push(IncorrectAnswerLink::new(
            question.id.clone(),
            question.correct_answer_id.clone(),
        ));
        let repo = InMemoryRepository::with_dataset(dataset).unwrap();

        let overlaps = repo.find_answer_overlaps().await.unwrap();
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].question_id, question.id);

        let counts = repo.category_question_counts().await.unwrap();
        assert_eq!(counts.iter().map(|(_, n)| n).sum::<u64>(), 5);
        assert!(counts.windows(2).all(|w| w[0].0.name <= w[1].0.name));
    }
}
