//! Named JSON records on top of a [`KeyValueStore`].
//!
//! All progress state lives in a handful of fixed records. This module owns
//! their key names, their JSON encoding and the first-run initialization.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use study_core::model::{AnswerLedger, ProgressBook, SubjectCatalog};
use tracing::{debug, info};

use crate::repository::{KeyValueStore, StorageError};

/// The fixed records the application persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordName {
    /// The answer ledger.
    Answers,
    /// Per-subject counters.
    Progress,
    /// Subject of the quiz in progress.
    CurrentSubject,
    /// Question the quiz cursor points at.
    CurrentQuestion,
}

impl RecordName {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RecordName::Answers => "answers",
            RecordName::Progress => "progress",
            RecordName::CurrentSubject => "current_subject",
            RecordName::CurrentQuestion => "current_question",
        }
    }
}

impl fmt::Display for RecordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which records [`RecordStore::ensure_initialized`] had to create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitReport {
    pub created_answers: bool,
    pub created_progress: bool,
}

/// Reads and writes named records as JSON.
///
/// An optional namespace prefixes every key (`ged` → `ged_answers`) so
/// several deployments can share one backing store.
#[derive(Clone)]
pub struct RecordStore {
    items: Arc<dyn KeyValueStore>,
    namespace: Option<String>,
}

impl RecordStore {
    #[must_use]
    pub fn new(items: Arc<dyn KeyValueStore>) -> Self {
        Self {
            items,
            namespace: None,
        }
    }

    /// Prefix keys with `namespace`. Blank namespaces are ignored.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let trimmed = namespace.trim();
        self.namespace = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// The backing key for `name`.
    #[must_use]
    pub fn key(&self, name: RecordName) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}_{}", name.as_str()),
            None => name.as_str().to_string(),
        }
    }

    /// Raw JSON text of a record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend read fails.
    pub async fn read_raw(&self, name: RecordName) -> Result<Option<String>, StorageError> {
        self.items.get_item(&self.key(name)).await
    }

    /// Decode a record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored text does not
    /// decode as `T`, or the backend error if the read fails.
    pub async fn read<T: DeserializeOwned>(
        &self,
        name: RecordName,
    ) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.read_raw(name).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StorageError::Serialization(format!("record {name}: {err}")))
    }

    /// Encode and store a record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails, or the
    /// backend error if the write fails.
    pub async fn write<T: Serialize + ?Sized>(
        &self,
        name: RecordName,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|err| StorageError::Serialization(format!("record {name}: {err}")))?;
        self.items.set_item(&self.key(name), &raw).await?;
        debug!(record = %name, bytes = raw.len(), "record written");
        Ok(())
    }

    /// Create an empty ledger and zeroed counters when either is missing.
    ///
    /// Existing records are left untouched, so calling this again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend read or write fails.
    pub async fn ensure_initialized(
        &self,
        catalog: &SubjectCatalog,
    ) -> Result<InitReport, StorageError> {
        let mut report = InitReport::default();

        if self.read_raw(RecordName::Answers).await?.is_none() {
            self.write(RecordName::Answers, &AnswerLedger::new()).await?;
            report.created_answers = true;
        }

        if self.read_raw(RecordName::Progress).await?.is_none() {
            self.write(RecordName::Progress, &ProgressBook::zeroed(catalog))
                .await?;
            report.created_progress = true;
        }

        if report.created_answers || report.created_progress {
            info!(
                answers = report.created_answers,
                progress = report.created_progress,
                "initialized progress records"
            );
        }
        Ok(report)
    }
}
