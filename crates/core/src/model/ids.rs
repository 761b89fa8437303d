use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when building a `QuestionId`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("question ids start at 1")]
    Zero,

    #[error("failed to parse question id from {raw:?}")]
    Parse { raw: String },
}

/// Position of a question inside its subject's bank (1-based).
///
/// Serialized as a bare integer, and as a string when used as a JSON object
/// key (`{"12": {...}}`), which is how the stored ledger keys its entries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct QuestionId(u32);

impl QuestionId {
    pub const FIRST: QuestionId = QuestionId(1);

    /// Creates a `QuestionId`.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Zero` for `0`.
    pub fn new(id: u32) -> Result<Self, IdError> {
        if id == 0 {
            return Err(IdError::Zero);
        }
        Ok(Self(id))
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Every id from 1 through `total`, ascending.
    pub fn first_n(total: u32) -> impl Iterator<Item = QuestionId> {
        (1..=total).map(QuestionId)
    }

    /// The following id, or `None` on overflow.
    #[must_use]
    pub fn next(self) -> Option<QuestionId> {
        self.0.checked_add(1).map(QuestionId)
    }

    /// The preceding id, or `None` for the first question.
    #[must_use]
    pub fn previous(self) -> Option<QuestionId> {
        match self.0 {
            1 => None,
            n => Some(QuestionId(n - 1)),
        }
    }
}

impl TryFrom<u32> for QuestionId {
    type Error = IdError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QuestionId> for u32 {
    fn from(id: QuestionId) -> Self {
        id.0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QuestionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<u32>().map_err(|_| IdError::Parse {
            raw: s.to_string(),
        })?;
        Self::new(value)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert_eq!(QuestionId::new(0).unwrap_err(), IdError::Zero);
        assert_eq!(QuestionId::new(7).unwrap().value(), 7);
    }

    #[test]
    fn parses_from_str() {
        let id: QuestionId = "42".parse().unwrap();
        assert_eq!(id.to_string(), "42");
        assert!("0".parse::<QuestionId>().is_err());
        assert!(matches!(
            "forty".parse::<QuestionId>(),
            Err(IdError::Parse { .. })
        ));
    }

    #[test]
    fn first_n_counts_from_one() {
        let ids: Vec<u32> = QuestionId::first_n(3).map(|id| id.value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(QuestionId::first_n(0).count(), 0);
    }

    #[test]
    fn previous_stops_at_first_question() {
        let first = QuestionId::new(1).unwrap();
        assert_eq!(first.previous(), None);
        assert_eq!(first.next().unwrap().value(), 2);
        assert_eq!(QuestionId::new(5).unwrap().previous().unwrap().value(), 4);
    }

    #[test]
    fn json_rejects_zero() {
        let parsed: Result<QuestionId, _> = serde_json::from_str("0");
        assert!(parsed.is_err());
        let parsed: QuestionId = serde_json::from_str("9").unwrap();
        assert_eq!(parsed.value(), 9);
    }
}
