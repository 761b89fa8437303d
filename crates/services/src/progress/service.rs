use storage::{RecordName, RecordStore};
use study_core::model::{
    AnswerLedger, AnswerRecord, CounterDrift, CounterTransition, OptionIndex, OverallProgress,
    ProgressBook, QuestionId, Subject, SubjectCatalog, SubjectProgress,
};
use tracing::{debug, info, warn};

use crate::Clock;
use crate::error::ProgressServiceError;

/// Records answers and keeps the per-subject counters in step with them.
///
/// The service is the single writer of the `answers` and `progress` records.
/// Every successful [`ProgressService::record_answer`] performs one ledger
/// write followed by one counters write.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    catalog: SubjectCatalog,
    records: RecordStore,
}

impl ProgressService {
    /// Open the service, creating the ledger and counters records on first use.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the backing store fails.
    pub async fn open(
        records: RecordStore,
        catalog: SubjectCatalog,
        clock: Clock,
    ) -> Result<Self, ProgressServiceError> {
        records.ensure_initialized(&catalog).await?;
        Ok(Self {
            clock,
            catalog,
            records,
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &SubjectCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub(crate) fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Persist an answer and apply the matching counter transition.
    ///
    /// Answering the same question again replaces the earlier record. The
    /// counters change according to [`CounterTransition::between`].
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Progress` if the stored counters cannot
    /// absorb the transition; nothing is written in that case.
    /// Returns `ProgressServiceError::Storage` if a read or write fails.
    pub async fn record_answer(
        &self,
        subject: &Subject,
        question: QuestionId,
        selected: OptionIndex,
        is_correct: bool,
    ) -> Result<AnswerRecord, ProgressServiceError> {
        let mut ledger = self.load_ledger().await?;
        let mut book = self.load_progress().await?;

        let transition = CounterTransition::between(ledger.get(subject, question), is_correct);
        let counters = book.apply(subject, transition)?;

        let record = AnswerRecord::new(selected, is_correct, self.clock.now());
        ledger.record(subject.clone(), question, record.clone());

        self.records.write(RecordName::Answers, &ledger).await?;
        self.records.write(RecordName::Progress, &book).await?;

        debug!(
            subject = %subject,
            question = %question,
            ?transition,
            answered = counters.answered(),
            correct = counters.correct(),
            "answer recorded"
        );
        Ok(record)
    }

    /// The stored answer for a question, if any.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the ledger cannot be read.
    pub async fn get_answer(
        &self,
        subject: &Subject,
        question: QuestionId,
    ) -> Result<Option<AnswerRecord>, ProgressServiceError> {
        let ledger = self.load_ledger().await?;
        Ok(ledger.get(subject, question).cloned())
    }

    /// Counters for one subject; zero for subjects never answered.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the counters cannot be read.
    pub async fn subject_progress(
        &self,
        subject: &Subject,
    ) -> Result<SubjectProgress, ProgressServiceError> {
        let book = self.load_progress().await?;
        Ok(book.get(subject))
    }

    /// Totals across every stored subject.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the counters cannot be read.
    pub async fn overall_progress(&self) -> Result<OverallProgress, ProgressServiceError> {
        let book = self.load_progress().await?;
        Ok(book.overall(self.catalog.expected_total()))
    }

    /// Every subject's counters, catalog subjects included even when unseen.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the counters cannot be read.
    pub async fn progress_book(&self) -> Result<ProgressBook, ProgressServiceError> {
        let mut book = self.load_progress().await?;
        book.ensure_subjects(&self.catalog);
        Ok(book)
    }

    /// Forget every answer for `subject` and zero its counters.
    ///
    /// Returns whether the subject had any answers.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a read or write fails.
    pub async fn reset_subject(&self, subject: &Subject) -> Result<bool, ProgressServiceError> {
        let mut ledger = self.load_ledger().await?;
        let mut book = self.load_progress().await?;

        let had_answers = ledger.clear_subject(subject);
        book.reset(subject);

        self.records.write(RecordName::Answers, &ledger).await?;
        self.records.write(RecordName::Progress, &book).await?;
        info!(subject = %subject, had_answers, "subject progress reset");
        Ok(had_answers)
    }

    /// Empty the ledger and zero the counters of every catalog subject.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a write fails.
    pub async fn reset_all(&self) -> Result<(), ProgressServiceError> {
        self.records
            .write(RecordName::Answers, &AnswerLedger::new())
            .await?;
        self.records
            .write(RecordName::Progress, &ProgressBook::zeroed(&self.catalog))
            .await?;
        info!("all progress reset");
        Ok(())
    }

    /// Compare the stored counters against a replay of the ledger.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a read fails.
    pub async fn check_counters(&self) -> Result<Vec<CounterDrift>, ProgressServiceError> {
        let ledger = self.load_ledger().await?;
        let book = self.load_progress().await?;
        let replayed = ProgressBook::replay(&ledger, &self.catalog);
        Ok(book.drift_from(&replayed))
    }

    /// Rebuild the counters from the ledger, persisting them when they drifted.
    ///
    /// Returns the subjects whose stored counters disagreed with the replay.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a read or write fails.
    pub async fn reconcile(&self) -> Result<Vec<CounterDrift>, ProgressServiceError> {
        let ledger = self.load_ledger().await?;
        let book = self.load_progress().await?;
        let replayed = ProgressBook::replay(&ledger, &self.catalog);
        let drift = book.drift_from(&replayed);

        if drift.is_empty() {
            info!("counters match the answer ledger");
            return Ok(drift);
        }

        for entry in &drift {
            warn!(
                subject = %entry.subject,
                stored_answered = entry.stored.answered(),
                stored_correct = entry.stored.correct(),
                replayed_answered = entry.replayed.answered(),
                replayed_correct = entry.replayed.correct(),
                "counter drift"
            );
        }
        self.records.write(RecordName::Progress, &replayed).await?;
        info!(subjects = drift.len(), "counters rebuilt from the answer ledger");
        Ok(drift)
    }

    pub(crate) async fn load_ledger(&self) -> Result<AnswerLedger, ProgressServiceError> {
        match self.records.read(RecordName::Answers).await? {
            Some(ledger) => Ok(ledger),
            None => {
                warn!(record = %RecordName::Answers, "record missing, treating as empty");
                Ok(AnswerLedger::new())
            }
        }
    }

    pub(crate) async fn load_progress(&self) -> Result<ProgressBook, ProgressServiceError> {
        match self.records.read(RecordName::Progress).await? {
            Some(book) => Ok(book),
            None => {
                warn!(record = %RecordName::Progress, "record missing, treating as zeroed");
                Ok(ProgressBook::zeroed(&self.catalog))
            }
        }
    }
}
