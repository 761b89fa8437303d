use std::sync::Arc;

use storage::RecordStore;
use storage::repository::Storage;
use study_core::model::SubjectCatalog;

use crate::Clock;
use crate::error::AppServicesError;
use crate::progress::ProgressService;
use crate::question_bank::{BankSource, QuestionBankService};

/// Where and how the app services keep their state.
#[derive(Debug, Clone, Default)]
pub struct ServiceOptions {
    /// Record key prefix; `None` uses the bare record names.
    pub namespace: Option<String>,
    pub catalog: SubjectCatalog,
}

/// Assembles app-facing services over one backing store.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
    question_bank: Arc<QuestionBankService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or record setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        bank: BankSource,
        options: ServiceOptions,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::assemble(&storage, bank, options, clock).await
    }

    /// Build services over a process-local store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if record setup fails.
    pub async fn in_memory(
        bank: BankSource,
        options: ServiceOptions,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        Self::assemble(&Storage::in_memory(), bank, options, clock).await
    }

    async fn assemble(
        storage: &Storage,
        bank: BankSource,
        options: ServiceOptions,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let mut records = RecordStore::new(Arc::clone(&storage.items));
        if let Some(namespace) = options.namespace {
            records = records.with_namespace(namespace);
        }
        let progress = Arc::new(ProgressService::open(records, options.catalog, clock).await?);
        let question_bank = Arc::new(QuestionBankService::new(bank));
        Ok(Self {
            progress,
            question_bank,
        })
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn question_bank(&self) -> Arc<QuestionBankService> {
        Arc::clone(&self.question_bank)
    }
}
