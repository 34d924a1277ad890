//! Demo dataset generation for testing and seeding.
//!
//! Pure functions with no side effects. Ids are derived from content with
//! UUID v5, so they are stable across runs and do not sort in generation
//! order, just like the ids of an imported dataset.

use uuid::Uuid;

use super::dataset::QuizDataset;
use super::types::{Answer, Category, Difficulty, IncorrectAnswerLink, Question, QuestionType};

const CATEGORIES: [&str; 5] = [
    "General Knowledge",
    "Science & Nature",
    "History",
    "Geography",
    "Sports",
];

const DIFFICULTIES: [&str; 3] = ["easy", "medium", "hard"];

const QUESTION_TYPES: [&str; 2] = ["multiple", "boolean"];

/// Builds a content-derived opaque id.
pub fn content_id(kind: &str, content: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{kind}:{content}").as_bytes()).to_string()
}

/// Generates a referentially consistent dataset with `question_count`
/// questions spread across the demo categories, difficulties and types.
///
/// Every third question is a true/false question sharing the "True" and
/// "False" answers; the others get one correct and three incorrect answers
/// of their own.
///
/// # Example
///
/// ```
/// use quizbank_core::quiz::generate_demo_dataset;
///
/// let dataset = generate_demo_dataset(30);
///
/// assert_eq!(dataset.questions.len(), 30);
/// assert!(dataset.validate().is_ok());
/// ```
pub fn generate_demo_dataset(question_count: u32) -> QuizDataset {
    let categories: Vec<Category> = CATEGORIES
        .iter()
        .map(|name| Category::new(content_id("category", name), *name))
        .collect();
    let difficulties: Vec<Difficulty> = DIFFICULTIES
        .iter()
        .map(|name| Difficulty::new(content_id("difficulty", name), *name))
        .collect();
    let question_types: Vec<QuestionType> = QUESTION_TYPES
        .iter()
        .map(|name| QuestionType::new(content_id("type", name), *name))
        .collect();

    let mut dataset = QuizDataset {
        categories,
        difficulties,
        question_types,
        ..QuizDataset::default()
    };

    if question_count == 0 {
        return dataset;
    }

    let truthy = Answer::new(content_id("answer", "True"), "True");
    let falsy = Answer::new(content_id("answer", "False"), "False");
    dataset.answers.push(truthy.clone());
    dataset.answers.push(falsy.clone());

    for i in 0..question_count as usize {
        let category = &dataset.categories[i % dataset.categories.len()];
        let difficulty = &dataset.difficulties[i % dataset.difficulties.len()];
        let is_boolean = i % 3 == 2;
        let question_type = &dataset.question_types[usize::from(is_boolean)];

        let text = if is_boolean {
            format!("{} statement #{}: this claim is true.", category.name, i + 1)
        } else {
            format!("{} question #{}: which option is correct?", category.name, i + 1)
        };
        let question_id = content_id("question", &text);

        let (correct, incorrect) = if is_boolean {
            let (correct, wrong) = if i % 2 == 0 {
                (truthy.clone(), falsy.clone())
            } else {
                (falsy.clone(), truthy.clone())
            };
            (correct, vec![wrong])
        } else {
            let option = |letter: char| {
                let text = format!("Option {}{}", i + 1, letter);
                Answer::new(content_id("answer", &text), text)
            };
            let correct = option('A');
            let incorrect = vec![option('B'), option('C'), option('D')];
            dataset.answers.push(correct.clone());
            dataset.answers.extend(incorrect.iter().cloned());
            (correct, incorrect)
        };

        dataset.questions.push(Question::new(
            question_id.clone(),
            text,
            category.id.clone(),
            difficulty.id.clone(),
            question_type.id.clone(),
            correct.id,
        ));
        dataset.incorrect_answers.extend(
            incorrect
                .into_iter()
                .map(|answer| IncorrectAnswerLink::new(question_id.clone(), answer.id)),
        );
    }

    dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::find_answer_overlaps;

    #[test]
    fn test_generates_requested_question_count() {
        for count in [0, 1, 7, 30] {
            assert_eq!(generate_demo_dataset(count).questions.len(), count as usize);
        }
    }

    #[test]
    fn test_generated_dataset_is_valid() {
        let dataset = generate_demo_dataset(50);

        assert_eq!(dataset.validate(), Ok(()));
        assert!(find_answer_overlaps(&dataset.questions, &dataset.incorrect_answers).is_empty());
    }

    #[test]
    fn test_generation_is_deterministic() {
        assert_eq!(generate_demo_dataset(12), generate_demo_dataset(12));
    }

    #[test]
    fn test_boolean_questions_share_answers() {
        let dataset = generate_demo_dataset(6);
        let truthy = content_id("answer", "True");

        let using_true = dataset
            .questions
            .iter()
            .filter(|q| q.correct_answer_id.as_str() == truthy)
            .count()
            + dataset
                .incorrect_answers
                .iter()
                .filter(|l| l.answer_id.as_str() == truthy)
                .count();

        assert_eq!(using_true, 2);
    }

    #[test]
    fn test_ids_are_not_in_generation_order() {
        let dataset = generate_demo_dataset(20);
        let ids: Vec<&str> = dataset.questions.iter().map(|q| q.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort();

        assert_ne!(ids, sorted);
    }

    #[test]
    fn test_empty_dataset_keeps_lookups() {
        let dataset = generate_demo_dataset(0);

        assert!(dataset.is_empty());
        assert!(dataset.answers.is_empty());
        assert_eq!(dataset.categories.len(), 5);
        assert_eq!(dataset.difficulties.len(), 3);
        assert_eq!(dataset.question_types.len(), 2);
    }
}
