use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::answer::{AnswerRecord, Outcome};
use crate::model::ids::QuestionId;
use crate::model::subject::Subject;

/// Answers for one subject, ordered by question id.
pub type SubjectAnswers = BTreeMap<QuestionId, AnswerRecord>;

/// Every recorded answer, keyed by subject then question id.
///
/// Serializes as the `answers` document:
/// `{ "math": { "1": { "selectedAnswer": 2, "isCorrect": true, "timestamp": ".." } } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerLedger {
    subjects: BTreeMap<Subject, SubjectAnswers>,
}

impl AnswerLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record`, returning the answer it replaced.
    pub fn record(
        &mut self,
        subject: Subject,
        id: QuestionId,
        record: AnswerRecord,
    ) -> Option<AnswerRecord> {
        self.subjects.entry(subject).or_default().insert(id, record)
    }

    #[must_use]
    pub fn get(&self, subject: &Subject, id: QuestionId) -> Option<&AnswerRecord> {
        self.subjects.get(subject).and_then(|answers| answers.get(&id))
    }

    #[must_use]
    pub fn answers(&self, subject: &Subject) -> Option<&SubjectAnswers> {
        self.subjects.get(subject)
    }

    /// Ids answered with the given outcome, ascending.
    #[must_use]
    pub fn ids_with_outcome(&self, subject: &Subject, outcome: Outcome) -> Vec<QuestionId> {
        self.answers(subject)
            .map(|answers| {
                answers
                    .iter()
                    .filter(|(_, record)| record.outcome() == outcome)
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ids in `1..=total` without a recorded answer, ascending.
    #[must_use]
    pub fn unanswered(&self, subject: &Subject, total: u32) -> Vec<QuestionId> {
        let answers = self.answers(subject);
        QuestionId::first_n(total)
            .filter(|id| answers.is_none_or(|answers| !answers.contains_key(id)))
            .collect()
    }

    /// Drop every answer for `subject`. Returns whether anything was removed.
    pub fn clear_subject(&mut self, subject: &Subject) -> bool {
        self.subjects.remove(subject).is_some()
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.keys()
    }

    /// Every (subject, id, record) triple in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Subject, QuestionId, &AnswerRecord)> {
        self.subjects.iter().flat_map(|(subject, answers)| {
            answers.iter().map(move |(id, record)| (subject, *id, record))
        })
    }
}
