use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("option index must be between 0 and 3, got {0}")]
    InvalidOption(u8),

    #[error("option letter must be one of A-D, got {0:?}")]
    InvalidLetter(String),

    #[error("unknown outcome {0:?} (expected \"correct\" or \"incorrect\")")]
    InvalidOutcome(String),
}

//
// ─── OPTION INDEX ──────────────────────────────────────────────────────────────
//

/// Number of answer options every question offers.
pub const OPTION_COUNT: u8 = 4;

/// Zero-based index of one of the four answer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct OptionIndex(u8);

impl OptionIndex {
    /// # Errors
    ///
    /// Returns `AnswerError::InvalidOption` if `index >= 4`.
    pub fn new(index: u8) -> Result<Self, AnswerError> {
        if index >= OPTION_COUNT {
            return Err(AnswerError::InvalidOption(index));
        }
        Ok(Self(index))
    }

    /// Parse a letter (`A`-`D`, case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::InvalidLetter` for anything else.
    pub fn from_letter(letter: &str) -> Result<Self, AnswerError> {
        let mut chars = letter.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                let offset = (c.to_ascii_uppercase() as u8).wrapping_sub(b'A');
                Self::new(offset).map_err(|_| AnswerError::InvalidLetter(letter.to_string()))
            }
            _ => Err(AnswerError::InvalidLetter(letter.to_string())),
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn letter(self) -> char {
        char::from(b'A' + self.0)
    }
}

impl TryFrom<u8> for OptionIndex {
    type Error = AnswerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OptionIndex> for u8 {
    fn from(index: OptionIndex) -> Self {
        index.0
    }
}

impl FromStr for OptionIndex {
    type Err = AnswerError;

    /// Accepts either a digit (`0`-`3`) or a letter (`A`-`D`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u8>() {
            Ok(index) => Self::new(index),
            Err(_) => Self::from_letter(s),
        }
    }
}

impl fmt::Display for OptionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Whether a recorded answer was right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    #[must_use]
    pub fn from_correct(is_correct: bool) -> Self {
        if is_correct {
            Self::Correct
        } else {
            Self::Incorrect
        }
    }

    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

impl FromStr for Outcome {
    type Err = AnswerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "correct" => Ok(Self::Correct),
            "incorrect" => Ok(Self::Incorrect),
            _ => Err(AnswerError::InvalidOutcome(s.to_string())),
        }
    }
}

//
// ─── ANSWER RECORD ─────────────────────────────────────────────────────────────
//

/// The current answer for one (subject, question) pair.
///
/// Re-answering replaces the record; no history is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    #[serde(rename = "selectedAnswer")]
    pub selected: OptionIndex,
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
    #[serde(rename = "timestamp")]
    pub recorded_at: DateTime<Utc>,
}

impl AnswerRecord {
    #[must_use]
    pub fn new(selected: OptionIndex, is_correct: bool, recorded_at: DateTime<Utc>) -> Self {
        Self {
            selected,
            is_correct,
            recorded_at,
        }
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        Outcome::from_correct(self.is_correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn option_index_bounds() {
        assert_eq!(OptionIndex::new(3).unwrap().letter(), 'D');
        assert_eq!(OptionIndex::new(4), Err(AnswerError::InvalidOption(4)));
    }

    #[test]
    fn option_index_parses_digits_and_letters() {
        assert_eq!("2".parse::<OptionIndex>().unwrap().value(), 2);
        assert_eq!("b".parse::<OptionIndex>().unwrap().value(), 1);
        assert_eq!(" C ".parse::<OptionIndex>().unwrap().value(), 2);
        assert!(matches!(
            "E".parse::<OptionIndex>(),
            Err(AnswerError::InvalidLetter(_))
        ));
        assert!(matches!(
            "AB".parse::<OptionIndex>(),
            Err(AnswerError::InvalidLetter(_))
        ));
        assert!("9".parse::<OptionIndex>().is_err());
    }

    #[test]
    fn outcome_parses_case_insensitively() {
        assert_eq!("Correct".parse::<Outcome>().unwrap(), Outcome::Correct);
        assert_eq!("incorrect".parse::<Outcome>().unwrap(), Outcome::Incorrect);
        assert!("maybe".parse::<Outcome>().is_err());
    }

    #[test]
    fn record_uses_stored_field_names() {
        let record = AnswerRecord::new(OptionIndex::new(2).unwrap(), true, fixed_now());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["selectedAnswer"], 2);
        assert_eq!(json["isCorrect"], true);
        assert_eq!(json["timestamp"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn record_rejects_out_of_range_selection() {
        let raw = r#"{"selectedAnswer":7,"isCorrect":false,"timestamp":"2024-01-01T00:00:00.000Z"}"#;
        assert!(serde_json::from_str::<AnswerRecord>(raw).is_err());

        let raw = r#"{"selectedAnswer":1,"isCorrect":false,"timestamp":"2024-01-01T00:00:00.000Z"}"#;
        let record: AnswerRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.outcome(), Outcome::Incorrect);
    }
}
