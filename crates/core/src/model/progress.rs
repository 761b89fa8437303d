use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::model::answer::AnswerRecord;
use crate::model::ledger::AnswerLedger;
use crate::model::subject::{Subject, SubjectCatalog};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("correct count ({correct}) exceeds answered count ({answered})")]
    CorrectExceedsAnswered { answered: u32, correct: u32 },

    #[error("counters for {subject} would underflow; they no longer match the recorded answers")]
    Underflow { subject: Subject },

    #[error("counters for {subject} would overflow")]
    Overflow { subject: Subject },
}

//
// ─── SUBJECT PROGRESS ──────────────────────────────────────────────────────────
//

#[derive(Deserialize)]
struct RawSubjectProgress {
    answered: u32,
    correct: u32,
}

/// Per-subject counters. Always satisfies `correct <= answered`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSubjectProgress")]
pub struct SubjectProgress {
    answered: u32,
    correct: u32,
}

impl SubjectProgress {
    /// # Errors
    ///
    /// Returns `ProgressError::CorrectExceedsAnswered` if `correct > answered`.
    pub fn new(answered: u32, correct: u32) -> Result<Self, ProgressError> {
        if correct > answered {
            return Err(ProgressError::CorrectExceedsAnswered { answered, correct });
        }
        Ok(Self { answered, correct })
    }

    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.answered
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.answered - self.correct
    }

    /// Accuracy as a whole percentage, 0 when nothing is answered.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        rounded_percent(u64::from(self.correct), u64::from(self.answered))
    }

    /// Counters after `transition`, leaving `self` untouched on error.
    ///
    /// # Errors
    ///
    /// Returns `Underflow` for a regression with no correct answers counted,
    /// `CorrectExceedsAnswered` for an improvement with nothing left to
    /// improve, and `Overflow` if `answered` would exceed `u32::MAX`.
    pub fn after(
        self,
        subject: &Subject,
        transition: CounterTransition,
    ) -> Result<Self, ProgressError> {
        let overflow = || ProgressError::Overflow {
            subject: subject.clone(),
        };
        let (answered, correct) = match transition {
            CounterTransition::FirstAnswer { correct } => (
                self.answered.checked_add(1).ok_or_else(overflow)?,
                self.correct + u32::from(correct),
            ),
            CounterTransition::Improved => {
                if self.correct >= self.answered {
                    return Err(ProgressError::CorrectExceedsAnswered {
                        answered: self.answered,
                        correct: self.correct + 1,
                    });
                }
                (self.answered, self.correct + 1)
            }
            CounterTransition::Regressed => (
                self.answered,
                self.correct
                    .checked_sub(1)
                    .ok_or_else(|| ProgressError::Underflow {
                        subject: subject.clone(),
                    })?,
            ),
            CounterTransition::Unchanged => (self.answered, self.correct),
        };
        Ok(Self { answered, correct })
    }
}

impl TryFrom<RawSubjectProgress> for SubjectProgress {
    type Error = ProgressError;

    fn try_from(raw: RawSubjectProgress) -> Result<Self, Self::Error> {
        Self::new(raw.answered, raw.correct)
    }
}

//
// ─── TRANSITIONS ───────────────────────────────────────────────────────────────
//

/// How recording an answer moves a subject's counters.
///
/// | prior answer      | now correct | transition      |
/// |-------------------|-------------|-----------------|
/// | none              | any         | `FirstAnswer`   |
/// | incorrect         | yes         | `Improved`      |
/// | correct           | no          | `Regressed`     |
/// | same correctness  | -           | `Unchanged`     |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterTransition {
    /// `answered += 1`, and `correct += 1` when the answer is right.
    FirstAnswer { correct: bool },
    /// A wrong answer was revised to a right one: `correct += 1`.
    Improved,
    /// A right answer was revised to a wrong one: `correct -= 1`.
    Regressed,
    Unchanged,
}

impl CounterTransition {
    /// Transition for replacing `previous` with an answer whose correctness
    /// is `is_correct_now`.
    #[must_use]
    pub fn between(previous: Option<&AnswerRecord>, is_correct_now: bool) -> Self {
        match previous.map(|record| record.is_correct) {
            None => Self::FirstAnswer {
                correct: is_correct_now,
            },
            Some(false) if is_correct_now => Self::Improved,
            Some(true) if !is_correct_now => Self::Regressed,
            Some(_) => Self::Unchanged,
        }
    }
}

//
// ─── PROGRESS BOOK ─────────────────────────────────────────────────────────────
//

/// Counters for every subject, serialized as the `progress` document:
/// `{ "math": { "answered": 3, "correct": 2 } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressBook {
    subjects: BTreeMap<Subject, SubjectProgress>,
}

/// A subject whose stored counters differ from a full replay of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterDrift {
    pub subject: Subject,
    pub stored: SubjectProgress,
    pub replayed: SubjectProgress,
}

impl ProgressBook {
    /// Zeroed counters for every catalog subject.
    #[must_use]
    pub fn zeroed(catalog: &SubjectCatalog) -> Self {
        let mut book = Self::default();
        book.ensure_subjects(catalog);
        book
    }

    /// Add zeroed entries for catalog subjects that are missing.
    pub fn ensure_subjects(&mut self, catalog: &SubjectCatalog) {
        for subject in catalog.subjects() {
            self.subjects.entry(subject.clone()).or_default();
        }
    }

    /// Counters for `subject`, zeroed when it has no entry.
    #[must_use]
    pub fn get(&self, subject: &Subject) -> SubjectProgress {
        self.subjects.get(subject).copied().unwrap_or_default()
    }

    /// Apply `transition` to `subject`, creating a zeroed entry first if needed.
    ///
    /// # Errors
    ///
    /// Propagates `ProgressError` from [`SubjectProgress::after`]; the book is
    /// unchanged on error.
    pub fn apply(
        &mut self,
        subject: &Subject,
        transition: CounterTransition,
    ) -> Result<SubjectProgress, ProgressError> {
        let updated = self.get(subject).after(subject, transition)?;
        self.subjects.insert(subject.clone(), updated);
        Ok(updated)
    }

    /// Zero the counters of `subject`.
    pub fn reset(&mut self, subject: &Subject) {
        self.subjects.insert(subject.clone(), SubjectProgress::zero());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Subject, SubjectProgress)> {
        self.subjects.iter().map(|(subject, progress)| (subject, *progress))
    }

    /// Sum of every stored entry against the expected question total.
    #[must_use]
    pub fn overall(&self, expected_total: u32) -> OverallProgress {
        let (answered, correct) = self
            .subjects
            .values()
            .fold((0_u64, 0_u64), |(answered, correct), progress| {
                (
                    answered + u64::from(progress.answered),
                    correct + u64::from(progress.correct),
                )
            });
        OverallProgress {
            answered,
            correct,
            total: expected_total,
            percentage: rounded_percent(correct, answered),
        }
    }

    /// Recompute counters from scratch by replaying every ledger entry.
    ///
    /// Catalog subjects without answers get zeroed entries.
    #[must_use]
    pub fn replay(ledger: &AnswerLedger, catalog: &SubjectCatalog) -> Self {
        let mut book = Self::zeroed(catalog);
        for subject in ledger.subjects() {
            let answers = ledger.answers(subject).map(|a| a.values());
            let (answered, correct) = answers.into_iter().flatten().fold(
                (0_u32, 0_u32),
                |(answered, correct), record| {
                    (
                        answered.saturating_add(1),
                        correct.saturating_add(u32::from(record.is_correct)),
                    )
                },
            );
            book.subjects
                .insert(subject.clone(), SubjectProgress { answered, correct });
        }
        book
    }

    /// Subjects whose counters differ from `replayed`. Absent entries count
    /// as zero on both sides.
    #[must_use]
    pub fn drift_from(&self, replayed: &ProgressBook) -> Vec<CounterDrift> {
        let subjects: BTreeSet<&Subject> =
            self.subjects.keys().chain(replayed.subjects.keys()).collect();
        subjects
            .into_iter()
            .filter_map(|subject| {
                let stored = self.get(subject);
                let expected = replayed.get(subject);
                (stored != expected).then(|| CounterDrift {
                    subject: subject.clone(),
                    stored,
                    replayed: expected,
                })
            })
            .collect()
    }
}

//
// ─── OVERALL ───────────────────────────────────────────────────────────────────
//

/// Cross-subject totals. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverallProgress {
    pub answered: u64,
    pub correct: u64,
    pub total: u32,
    /// `round(100 * correct / answered)`, or 0 before the first answer.
    pub percentage: u32,
}

/// `round(100 * part / whole)` with halves rounded up; 0 when `whole == 0`.
#[must_use]
pub fn rounded_percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    let scaled = (200 * u128::from(part) + u128::from(whole)) / (2 * u128::from(whole));
    u32::try_from(scaled).unwrap_or(u32::MAX)
}
