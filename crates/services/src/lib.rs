#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress;
pub mod question_bank;

pub use study_core::Clock;

pub use app_services::{AppServices, ServiceOptions};
pub use error::{AppServicesError, ProgressServiceError, QuestionBankError};
pub use progress::{ExportDocument, ProgressService, QuizPosition};
pub use question_bank::{BankSource, QuestionBankService, sample};
