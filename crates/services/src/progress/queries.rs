use study_core::model::{
    AnswerStatus, Outcome, Question, QuestionId, QuestionStats, Subject, SubjectAnswers,
    filter_by_status,
};

use super::service::ProgressService;
use crate::error::ProgressServiceError;

// Read-only views derived from the answer ledger.
impl ProgressService {
    /// Every answer recorded for `subject`, keyed by question id.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the ledger cannot be read.
    pub async fn list_answers(
        &self,
        subject: &Subject,
    ) -> Result<SubjectAnswers, ProgressServiceError> {
        let ledger = self.load_ledger().await?;
        Ok(ledger.answers(subject).cloned().unwrap_or_default())
    }

    /// Ids of the questions whose latest answer has `outcome`, ascending.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the ledger cannot be read.
    pub async fn list_by_outcome(
        &self,
        subject: &Subject,
        outcome: Outcome,
    ) -> Result<Vec<QuestionId>, ProgressServiceError> {
        let ledger = self.load_ledger().await?;
        Ok(ledger.ids_with_outcome(subject, outcome))
    }

    /// Ids in `1..=total_questions` without a recorded answer, ascending.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the ledger cannot be read.
    pub async fn list_unanswered(
        &self,
        subject: &Subject,
        total_questions: u32,
    ) -> Result<Vec<QuestionId>, ProgressServiceError> {
        let ledger = self.load_ledger().await?;
        Ok(ledger.unanswered(subject, total_questions))
    }

    /// Questions from a loaded bank that match `status`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the ledger cannot be read.
    pub async fn filter_questions<'a>(
        &self,
        subject: &Subject,
        questions: &'a [Question],
        status: AnswerStatus,
    ) -> Result<Vec<&'a Question>, ProgressServiceError> {
        let answers = self.list_answers(subject).await?;
        Ok(filter_by_status(questions, status, &answers))
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the ledger cannot be read.
    pub async fn question_stats(
        &self,
        subject: &Subject,
        questions: &[Question],
    ) -> Result<QuestionStats, ProgressServiceError> {
        let answers = self.list_answers(subject).await?;
        Ok(QuestionStats::compute(questions, &answers))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use storage::RecordStore;
    use storage::repository::InMemoryStore;
    use study_core::model::{OptionIndex, SubjectCatalog};
    use study_core::time::fixed_clock;

    use super::*;

    async fn service_with_answers() -> ProgressService {
        let records = RecordStore::new(Arc::new(InMemoryStore::new()));
        let service = ProgressService::open(records, SubjectCatalog::ged(), fixed_clock())
            .await
            .unwrap();
        let math = Subject::new("math").unwrap();
        for (id, correct) in [(5, true), (2, false), (9, true), (3, false)] {
            service
                .record_answer(
                    &math,
                    QuestionId::new(id).unwrap(),
                    OptionIndex::new(0).unwrap(),
                    correct,
                )
                .await
                .unwrap();
        }
        service
    }

    fn ids(raw: &[u32]) -> Vec<QuestionId> {
        raw.iter().map(|id| QuestionId::new(*id).unwrap()).collect()
    }

    #[tokio::test]
    async fn outcome_lists_partition_answered_ids() {
        let service = service_with_answers().await;
        let math = Subject::new("math").unwrap();

        let correct = service.list_by_outcome(&math, Outcome::Correct).await.unwrap();
        let incorrect = service
            .list_by_outcome(&math, Outcome::Incorrect)
            .await
            .unwrap();
        assert_eq!(correct, ids(&[5, 9]));
        assert_eq!(incorrect, ids(&[2, 3]));

        let answered: Vec<QuestionId> = service
            .list_answers(&math)
            .await
            .unwrap()
            .into_keys()
            .collect();
        let mut joined = [correct, incorrect].concat();
        joined.sort();
        assert_eq!(joined, answered);
    }

    #[tokio::test]
    async fn unanswered_is_the_complement() {
        let service = service_with_answers().await;
        let math = Subject::new("math").unwrap();

        let unanswered = service.list_unanswered(&math, 10).await.unwrap();
        assert_eq!(unanswered, ids(&[1, 4, 6, 7, 8, 10]));
        assert!(service.list_unanswered(&math, 0).await.unwrap().is_empty());

        let rla = Subject::new("rla").unwrap();
        assert_eq!(service.list_unanswered(&rla, 3).await.unwrap(), ids(&[1, 2, 3]));
        assert!(service.list_answers(&rla).await.unwrap().is_empty());
    }
}
