use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a [`Question`]. Ordered by byte-wise string comparison.
    QuestionId
);
opaque_id!(
    /// Identifier of an [`Answer`].
    AnswerId
);
opaque_id!(
    /// Identifier of a [`Category`].
    CategoryId
);
opaque_id!(
    /// Identifier of a [`Difficulty`].
    DifficultyId
);
opaque_id!(
    /// Identifier of a [`QuestionType`].
    TypeId
);

/// A trivia question as stored: text plus references to its lookups and its
/// correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub category_id: CategoryId,
    pub difficulty_id: DifficultyId,
    pub type_id: TypeId,
    pub correct_answer_id: AnswerId,
}

impl Question {
    pub fn new(
        id: impl Into<QuestionId>,
        text: impl Into<String>,
        category_id: impl Into<CategoryId>,
        difficulty_id: impl Into<DifficultyId>,
        type_id: impl Into<TypeId>,
        correct_answer_id: impl Into<AnswerId>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            category_id: category_id.into(),
            difficulty_id: difficulty_id.into(),
            type_id: type_id.into(),
            correct_answer_id: correct_answer_id.into(),
        }
    }
}

/// An answer text. The same answer can be the correct answer for some
/// questions and a wrong option for others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub text: String,
}

impl Answer {
    pub fn new(id: impl Into<AnswerId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    /// Unique across categories.
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difficulty {
    pub id: DifficultyId,
    /// Unique across difficulties.
    pub name: String,
}

impl Difficulty {
    pub fn new(id: impl Into<DifficultyId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The kind of question, e.g. multiple choice or true/false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionType {
    pub id: TypeId,
    /// Unique across question types.
    pub name: String,
}

impl QuestionType {
    pub fn new(id: impl Into<TypeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Join row: `answer_id` is a wrong option for `question_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IncorrectAnswerLink {
    pub question_id: QuestionId,
    pub answer_id: AnswerId,
}

impl IncorrectAnswerLink {
    pub fn new(question_id: impl Into<QuestionId>, answer_id: impl Into<AnswerId>) -> Self {
        Self {
            question_id: question_id.into(),
            answer_id: answer_id.into(),
        }
    }
}

/// A question hydrated with every related entity.
///
/// The single-valued relations are plain fields, so a partially hydrated
/// question cannot be represented. `incorrect_answers` is only filled when
/// the query asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDetails {
    pub id: QuestionId,
    pub text: String,
    pub category: Category,
    pub difficulty: Difficulty,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub correct_answer: Answer,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incorrect_answers: Vec<Answer>,
}

/// A question whose correct answer is also linked as one of its wrong options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOverlap {
    pub question_id: QuestionId,
    pub answer_id: AnswerId,
}
