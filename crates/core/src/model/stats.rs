use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ledger::SubjectAnswers;
use crate::model::progress::rounded_percent;
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown answer status {0:?}")]
pub struct StatusParseError(pub String);

/// Filter applied to a subject's questions against its recorded answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStatus {
    Answered,
    Unanswered,
    Correct,
    Incorrect,
}

impl AnswerStatus {
    fn matches(self, question: &Question, answers: &SubjectAnswers) -> bool {
        let record = answers.get(&question.id);
        match self {
            AnswerStatus::Answered => record.is_some(),
            AnswerStatus::Unanswered => record.is_none(),
            AnswerStatus::Correct => record.is_some_and(|r| r.is_correct),
            AnswerStatus::Incorrect => record.is_some_and(|r| !r.is_correct),
        }
    }
}

impl FromStr for AnswerStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "answered" => Ok(Self::Answered),
            "unanswered" => Ok(Self::Unanswered),
            "correct" => Ok(Self::Correct),
            "incorrect" => Ok(Self::Incorrect),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

/// Questions from `questions` in the given status, bank order preserved.
#[must_use]
pub fn filter_by_status<'a>(
    questions: &'a [Question],
    status: AnswerStatus,
    answers: &SubjectAnswers,
) -> Vec<&'a Question> {
    questions
        .iter()
        .filter(|question| status.matches(question, answers))
        .collect()
}

/// Completion and accuracy of one subject measured against its loaded bank.
///
/// Only answers to questions present in the bank are counted, so stale
/// entries for removed questions do not inflate the numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionStats {
    pub total: u32,
    pub answered: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub unanswered: u32,
    /// `round(100 * correct / answered)`.
    pub accuracy: u32,
    /// `round(100 * answered / total)`.
    pub completion: u32,
}

impl QuestionStats {
    #[must_use]
    pub fn compute(questions: &[Question], answers: &SubjectAnswers) -> Self {
        let count = |status| {
            let n = filter_by_status(questions, status, answers).len();
            u32::try_from(n).unwrap_or(u32::MAX)
        };
        let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);
        let answered = count(AnswerStatus::Answered);
        let correct = count(AnswerStatus::Correct);
        Self {
            total,
            answered,
            correct,
            incorrect: answered - correct,
            unanswered: total - answered,
            accuracy: rounded_percent(u64::from(correct), u64::from(answered)),
            completion: rounded_percent(u64::from(answered), u64::from(total)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::answer::{AnswerRecord, OptionIndex};
    use crate::model::ids::QuestionId;
    use crate::time::fixed_now;

    fn question(id: u32) -> Question {
        Question {
            id: QuestionId::new(id).unwrap(),
            question: format!("Q{id}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: 0,
            correct_letter: "A".into(),
            explanation: String::new(),
            passage: None,
        }
    }

    fn answers(entries: &[(u32, bool)]) -> SubjectAnswers {
        entries
            .iter()
            .map(|&(id, is_correct)| {
                (
                    QuestionId::new(id).unwrap(),
                    AnswerRecord::new(OptionIndex::new(0).unwrap(), is_correct, fixed_now()),
                )
            })
            .collect()
    }

    #[test]
    fn filters_by_status() {
        let bank: Vec<Question> = (1..=4).map(question).collect();
        let recorded = answers(&[(1, true), (3, false)]);

        let ids = |status| -> Vec<u32> {
            filter_by_status(&bank, status, &recorded)
                .iter()
                .map(|q| q.id.value())
                .collect()
        };
        assert_eq!(ids(AnswerStatus::Answered), vec![1, 3]);
        assert_eq!(ids(AnswerStatus::Unanswered), vec![2, 4]);
        assert_eq!(ids(AnswerStatus::Correct), vec![1]);
        assert_eq!(ids(AnswerStatus::Incorrect), vec![3]);
    }

    #[test]
    fn stats_ignore_answers_outside_the_bank() {
        let bank: Vec<Question> = (1..=3).map(question).collect();
        let recorded = answers(&[(1, true), (2, false), (9, true)]);

        let stats = QuestionStats::compute(&bank, &recorded);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.answered, 2);
        assert_eq!(stats.correct, 1);
        assert_eq!(stats.incorrect, 1);
        assert_eq!(stats.unanswered, 1);
        assert_eq!(stats.accuracy, 50);
        assert_eq!(stats.completion, 67);
    }

    #[test]
    fn empty_bank_has_zero_percentages() {
        let stats = QuestionStats::compute(&[], &SubjectAnswers::new());
        assert_eq!(stats.accuracy, 0);
        assert_eq!(stats.completion, 0);
    }

    #[test]
    fn status_parses() {
        assert_eq!("Unanswered".parse::<AnswerStatus>().unwrap(), AnswerStatus::Unanswered);
        assert!("skipped".parse::<AnswerStatus>().is_err());
    }
}
