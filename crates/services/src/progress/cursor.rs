use storage::RecordName;
use study_core::model::{QuestionId, Subject};
use tracing::debug;

use super::service::ProgressService;
use crate::error::ProgressServiceError;

/// Where the learner currently is in a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizPosition {
    pub subject: Subject,
    pub question: QuestionId,
}

impl ProgressService {
    /// Begin a quiz on `subject` at its first question.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a write fails.
    pub async fn start_quiz(
        &self,
        subject: &Subject,
    ) -> Result<QuizPosition, ProgressServiceError> {
        let position = QuizPosition {
            subject: subject.clone(),
            question: QuestionId::FIRST,
        };
        self.records()
            .write(RecordName::CurrentSubject, &position.subject)
            .await?;
        self.save_question(position.question).await?;
        Ok(position)
    }

    /// The persisted position, or `None` when no quiz was started.
    ///
    /// An unreadable question number falls back to the first question.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a read fails.
    pub async fn current_position(&self) -> Result<Option<QuizPosition>, ProgressServiceError> {
        let records = self.records();
        let Some(subject) = records.read::<Subject>(RecordName::CurrentSubject).await? else {
            return Ok(None);
        };
        let question = match records.read::<QuestionId>(RecordName::CurrentQuestion).await {
            Ok(Some(question)) => question,
            Ok(None) | Err(storage::StorageError::Serialization(_)) => QuestionId::FIRST,
            Err(err) => return Err(err.into()),
        };
        Ok(Some(QuizPosition { subject, question }))
    }

    /// Jump to `question` within the current quiz.
    ///
    /// Returns `None` when no quiz was started.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a read or write fails.
    pub async fn go_to(
        &self,
        question: QuestionId,
    ) -> Result<Option<QuizPosition>, ProgressServiceError> {
        let Some(mut position) = self.current_position().await? else {
            return Ok(None);
        };
        position.question = question;
        self.save_question(question).await?;
        Ok(Some(position))
    }

    /// Advance to the next question, staying put after `bank_len`.
    ///
    /// Returns `None` when no quiz was started or the cursor is on the last
    /// question.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a read or write fails.
    pub async fn next_question(
        &self,
        bank_len: u32,
    ) -> Result<Option<QuizPosition>, ProgressServiceError> {
        let Some(position) = self.current_position().await? else {
            return Ok(None);
        };
        match position.question.next() {
            Some(next) if next.value() <= bank_len => self.go_to(next).await,
            _ => Ok(None),
        }
    }

    /// Step back one question, staying put on the first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a read or write fails.
    pub async fn previous_question(&self) -> Result<Option<QuizPosition>, ProgressServiceError> {
        let Some(position) = self.current_position().await? else {
            return Ok(None);
        };
        match position.question.previous() {
            Some(previous) => self.go_to(previous).await,
            None => Ok(None),
        }
    }

    async fn save_question(&self, question: QuestionId) -> Result<(), ProgressServiceError> {
        self.records()
            .write(RecordName::CurrentQuestion, &question)
            .await?;
        debug!(question = %question, "quiz cursor moved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use storage::RecordStore;
    use storage::repository::{InMemoryStore, KeyValueStore};
    use study_core::model::SubjectCatalog;
    use study_core::time::fixed_clock;

    use super::*;

    async fn open() -> (InMemoryStore, ProgressService) {
        let items = InMemoryStore::new();
        let records = RecordStore::new(Arc::new(items.clone()));
        let service = ProgressService::open(records, SubjectCatalog::ged(), fixed_clock())
            .await
            .unwrap();
        (items, service)
    }

    fn qid(id: u32) -> QuestionId {
        QuestionId::new(id).unwrap()
    }

    #[tokio::test]
    async fn cursor_is_empty_before_a_quiz() {
        let (_, service) = open().await;
        assert!(service.current_position().await.unwrap().is_none());
        assert!(service.next_question(10).await.unwrap().is_none());
        assert!(service.go_to(qid(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cursor_moves_within_the_bank() {
        let (items, service) = open().await;
        let rla = Subject::new("rla").unwrap();

        let start = service.start_quiz(&rla).await.unwrap();
        assert_eq!(start.question, qid(1));
        assert_eq!(
            items.get_item("current_subject").await.unwrap().as_deref(),
            Some("\"rla\"")
        );

        assert!(service.previous_question().await.unwrap().is_none());
        let second = service.next_question(3).await.unwrap().unwrap();
        assert_eq!(second.question, qid(2));
        let third = service.next_question(3).await.unwrap().unwrap();
        assert_eq!(third.question, qid(3));
        assert!(service.next_question(3).await.unwrap().is_none());

        let back = service.previous_question().await.unwrap().unwrap();
        assert_eq!(back, QuizPosition { subject: rla.clone(), question: qid(2) });

        service.go_to(qid(40)).await.unwrap();
        let current = service.current_position().await.unwrap().unwrap();
        assert_eq!(current.question, qid(40));

        // Restarting returns to the first question.
        assert_eq!(service.start_quiz(&rla).await.unwrap().question, qid(1));
    }

    #[tokio::test]
    async fn unreadable_question_falls_back_to_first() {
        let (items, service) = open().await;
        service
            .start_quiz(&Subject::new("math").unwrap())
            .await
            .unwrap();
        items.set_item("current_question", "\"abc\"").await.unwrap();

        let position = service.current_position().await.unwrap().unwrap();
        assert_eq!(position.question, qid(1));
    }
}
