use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::{OPTION_COUNT, OptionIndex};
use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has empty text")]
    EmptyText { id: QuestionId },

    #[error("question {id} must have exactly 4 options, found {found}")]
    OptionCount { id: QuestionId, found: usize },

    #[error("question {id} has invalid correctAnswer index {index}")]
    CorrectIndex { id: QuestionId, index: u8 },

    #[error("question {id} has correctLetter {letter:?} but correctAnswer {index}")]
    LetterMismatch {
        id: QuestionId,
        letter: String,
        index: u8,
    },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Table attached to a reading passage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageTable {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// Shared reading material shown above a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passage {
    pub content: String,
    #[serde(default)]
    pub has_table: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<PassageTable>,
}

/// One multiple-choice question as it appears in a subject's bank file.
///
/// Deserialization only checks field presence and types; call
/// [`Question::validate`] for the structural rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: u8,
    pub correct_letter: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage: Option<Passage>,
}

impl Question {
    /// # Errors
    ///
    /// Returns the first rule the question breaks.
    pub fn validate(&self) -> Result<(), QuestionError> {
        let id = self.id;
        if self.question.trim().is_empty() {
            return Err(QuestionError::EmptyText { id });
        }
        if self.options.len() != usize::from(OPTION_COUNT) {
            return Err(QuestionError::OptionCount {
                id,
                found: self.options.len(),
            });
        }
        OptionIndex::new(self.correct_answer).map_err(|_| QuestionError::CorrectIndex {
            id,
            index: self.correct_answer,
        })?;
        Ok(())
    }

    /// `LetterMismatch` when `correctLetter` does not name `correctAnswer`.
    ///
    /// Not part of [`Question::validate`]; `correctAnswer` is authoritative.
    #[must_use]
    pub fn letter_mismatch(&self) -> Option<QuestionError> {
        let matches = match (
            OptionIndex::from_letter(&self.correct_letter),
            OptionIndex::new(self.correct_answer),
        ) {
            (Ok(letter), Ok(correct)) => letter == correct,
            _ => false,
        };
        (!matches).then(|| QuestionError::LetterMismatch {
            id: self.id,
            letter: self.correct_letter.clone(),
            index: self.correct_answer,
        })
    }

    /// Whether choosing `selected` answers the question correctly.
    #[must_use]
    pub fn is_correct(&self, selected: OptionIndex) -> bool {
        selected.value() == self.correct_answer
    }

    /// Option text for `index`, if present.
    #[must_use]
    pub fn option(&self, index: OptionIndex) -> Option<&str> {
        self.options.get(usize::from(index.value())).map(String::as_str)
    }

    fn mentions(&self, needle: &str) -> bool {
        self.question.to_lowercase().contains(needle)
            || self.options.join(" ").to_lowercase().contains(needle)
            || self.explanation.to_lowercase().contains(needle)
    }
}

/// Validate a whole bank, returning every failure.
#[must_use]
pub fn validate_set(questions: &[Question]) -> Vec<QuestionError> {
    questions
        .iter()
        .filter_map(|question| question.validate().err())
        .collect()
}

/// Questions whose text, options or explanation contain `term`
/// (case-insensitive).
#[must_use]
pub fn search<'a>(questions: &'a [Question], term: &str) -> Vec<&'a Question> {
    let needle = term.to_lowercase();
    questions.iter().filter(|q| q.mentions(&needle)).collect()
}

/// Zero-pad `number` to the digit width of `total` (`7` of `100` → `"007"`).
#[must_use]
pub fn format_question_number(number: u32, total: u32) -> String {
    let width = total.to_string().len();
    format!("{number:0width$}")
}
