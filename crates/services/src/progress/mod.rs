mod cursor;
mod queries;
mod service;
mod transfer;

pub use crate::error::ProgressServiceError;
pub use cursor::QuizPosition;
pub use service::ProgressService;
pub use transfer::ExportDocument;
