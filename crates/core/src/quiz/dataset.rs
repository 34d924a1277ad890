//! A complete trivia dataset held in memory.
//!
//! This is the unit the out-of-band seed path imports and the in-memory
//! backend serves from. Validation is pure and mirrors the constraints the
//! SQLite schema enforces.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::error::DatasetError;
use super::types::{
    Answer, AnswerId, AnswerOverlap, Category, Difficulty, IncorrectAnswerLink, Question,
    QuestionId, QuestionType,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDataset {
    pub categories: Vec<Category>,
    pub difficulties: Vec<Difficulty>,
    pub question_types: Vec<QuestionType>,
    pub answers: Vec<Answer>,
    pub questions: Vec<Question>,
    pub incorrect_answers: Vec<IncorrectAnswerLink>,
}

impl QuizDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Checks id and label uniqueness and that every question and link
    /// reference points at an existing row.
    ///
    /// Duplicate incorrect-answer links are rejected as duplicate ids, since
    /// the pair is the link's identity.
    pub fn validate(&self) -> Result<(), DatasetError> {
        unique_ids("Category", self.categories.iter().map(|c| c.id.as_str()))?;
        unique_ids("Difficulty", self.difficulties.iter().map(|d| d.id.as_str()))?;
        unique_ids("QuestionType", self.question_types.iter().map(|t| t.id.as_str()))?;
        unique_ids("Answer", self.answers.iter().map(|a| a.id.as_str()))?;
        unique_ids("Question", self.questions.iter().map(|q| q.id.as_str()))?;

        unique_labels("Category", self.categories.iter().map(|c| c.name.as_str()))?;
        unique_labels("Difficulty", self.difficulties.iter().map(|d| d.name.as_str()))?;
        unique_labels("QuestionType", self.question_types.iter().map(|t| t.name.as_str()))?;
        unique_labels("Answer", self.answers.iter().map(|a| a.text.as_str()))?;

        let categories: HashSet<&str> = self.categories.iter().map(|c| c.id.as_str()).collect();
        let difficulties: HashSet<&str> =
            self.difficulties.iter().map(|d| d.id.as_str()).collect();
        let types: HashSet<&str> = self.question_types.iter().map(|t| t.id.as_str()).collect();
        let answers: HashSet<&str> = self.answers.iter().map(|a| a.id.as_str()).collect();
        let questions: HashSet<&str> = self.questions.iter().map(|q| q.id.as_str()).collect();

        for question in &self.questions {
            let checks = [
                ("Category", question.category_id.as_str(), &categories),
                ("Difficulty", question.difficulty_id.as_str(), &difficulties),
                ("QuestionType", question.type_id.as_str(), &types),
                ("Answer", question.correct_answer_id.as_str(), &answers),
            ];
            for (entity_type, id, known) in checks {
                if !known.contains(id) {
                    return Err(DatasetError::DanglingReference {
                        question_id: question.id.to_string(),
                        entity_type,
                        id: id.to_string(),
                    });
                }
            }
        }

        let mut links = HashSet::new();
        for link in &self.incorrect_answers {
            if !questions.contains(link.question_id.as_str()) {
                return Err(DatasetError::DanglingReference {
                    question_id: link.question_id.to_string(),
                    entity_type: "Question",
                    id: link.question_id.to_string(),
                });
            }
            if !answers.contains(link.answer_id.as_str()) {
                return Err(DatasetError::DanglingReference {
                    question_id: link.question_id.to_string(),
                    entity_type: "Answer",
                    id: link.answer_id.to_string(),
                });
            }
            if !links.insert(link) {
                return Err(DatasetError::DuplicateId {
                    entity_type: "IncorrectAnswerLink",
                    id: format!("{}:{}", link.question_id, link.answer_id),
                });
            }
        }

        Ok(())
    }

    /// Incorrect-answer ids per question, in link order.
    pub fn incorrect_answer_index(&self) -> BTreeMap<QuestionId, Vec<AnswerId>> {
        let mut index: BTreeMap<QuestionId, Vec<AnswerId>> = BTreeMap::new();
        for link in &self.incorrect_answers {
            index
                .entry(link.question_id.clone())
                .or_default()
                .push(link.answer_id.clone());
        }
        index
    }
}

/// Finds links that list a question's correct answer as one of its wrong
/// options. The result is ordered by question id, then answer id.
pub fn find_answer_overlaps(
    questions: &[Question],
    links: &[IncorrectAnswerLink],
) -> Vec<AnswerOverlap> {
    let correct: BTreeMap<&QuestionId, &AnswerId> = questions
        .iter()
        .map(|q| (&q.id, &q.correct_answer_id))
        .collect();

    let mut overlaps: Vec<AnswerOverlap> = links
        .iter()
        .filter(|link| correct.get(&link.question_id) == Some(&&link.answer_id))
        .map(|link| AnswerOverlap {
            question_id: link.question_id.clone(),
            answer_id: link.answer_id.clone(),
        })
        .collect();

    overlaps.sort_by(|a, b| {
        a.question_id
            .cmp(&b.question_id)
            .then_with(|| a.answer_id.cmp(&b.answer_id))
    });
    overlaps.dedup();
    overlaps
}

fn unique_ids<'a>(
    entity_type: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), DatasetError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(DatasetError::DuplicateId {
                entity_type,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

fn unique_labels<'a>(
    entity_type: &'static str,
    labels: impl Iterator<Item = &'a str>,
) -> Result<(), DatasetError> {
    let mut seen = HashSet::new();
    for label in labels {
        if !seen.insert(label) {
            return Err(DatasetError::DuplicateLabel {
                entity_type,
                label: label.to_string(),
            });
        }
    }
    Ok(())
}
