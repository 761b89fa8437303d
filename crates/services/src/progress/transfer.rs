use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use storage::RecordName;
use study_core::model::{AnswerLedger, ProgressBook};
use tracing::{info, warn};

use super::service::ProgressService;
use crate::error::ProgressServiceError;

/// Backup document holding both records.
///
/// Serialized as `{ "answers": ..., "progress": ..., "exportDate": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub answers: AnswerLedger,
    pub progress: ProgressBook,
    #[serde(rename = "exportDate")]
    pub export_date: DateTime<Utc>,
}

impl ProgressService {
    /// Snapshot both records, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a record cannot be read.
    pub async fn export_all(&self) -> Result<ExportDocument, ProgressServiceError> {
        Ok(ExportDocument {
            answers: self.load_ledger().await?,
            progress: self.load_progress().await?,
            export_date: self.clock().now(),
        })
    }

    /// [`ProgressService::export_all`] rendered as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a record cannot be read, or
    /// `ProgressServiceError::Encode` if rendering fails.
    pub async fn export_json(&self) -> Result<String, ProgressServiceError> {
        let document = self.export_all().await?;
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Replace the stored records with those found in a backup document.
    ///
    /// `answers` and `progress` are each optional; a present field replaces
    /// the whole record. Counters that disagree with a replay of the
    /// resulting ledger are rebuilt from it before anything is written.
    /// Returns `Ok(false)` without touching the store when the text is not a
    /// JSON object or a present field is malformed.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a write fails.
    pub async fn import_all(&self, raw: &str) -> Result<bool, ProgressServiceError> {
        let document = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(document)) => document,
            Ok(other) => {
                warn!(kind = json_kind(&other), "import rejected: not a JSON object");
                return Ok(false);
            }
            Err(err) => {
                warn!(error = %err, "import rejected: unparseable JSON");
                return Ok(false);
            }
        };

        let Some(answers) = decode_field::<AnswerLedger>(&document, "answers") else {
            return Ok(false);
        };
        let Some(progress) = decode_field::<ProgressBook>(&document, "progress") else {
            return Ok(false);
        };

        let imported_progress = progress.is_some();
        let ledger = match &answers {
            Some(ledger) => ledger.clone(),
            None => self.load_ledger().await?,
        };
        let mut book = match progress {
            Some(book) => book,
            None => self.load_progress().await?,
        };
        book.ensure_subjects(self.catalog());

        let replayed = ProgressBook::replay(&ledger, self.catalog());
        let drift = book.drift_from(&replayed);
        for entry in &drift {
            warn!(
                subject = %entry.subject,
                stored_answered = entry.stored.answered(),
                stored_correct = entry.stored.correct(),
                replayed_answered = entry.replayed.answered(),
                replayed_correct = entry.replayed.correct(),
                "imported counters disagree with the answers, rebuilding"
            );
        }
        if !drift.is_empty() {
            book = replayed;
        }

        if answers.is_some() {
            self.records().write(RecordName::Answers, &ledger).await?;
        }
        if imported_progress || !drift.is_empty() {
            self.records().write(RecordName::Progress, &book).await?;
        }

        info!(
            answers = answers.is_some(),
            progress = imported_progress,
            rebuilt = drift.len(),
            "progress imported"
        );
        Ok(true)
    }
}

/// `Some(None)` when the field is absent or null, `None` when it is malformed.
fn decode_field<T: DeserializeOwned>(
    document: &Map<String, Value>,
    field: &'static str,
) -> Option<Option<T>> {
    match document.get(field) {
        None | Some(Value::Null) => Some(None),
        Some(value) => match T::deserialize(value) {
            Ok(decoded) => Some(Some(decoded)),
            Err(err) => {
                warn!(field, error = %err, "import rejected: malformed field");
                None
            }
        },
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
