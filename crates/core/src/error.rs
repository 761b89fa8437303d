use thiserror::Error;

use crate::model::{
    AnswerError, CatalogError, IdError, ProgressError, QuestionError, StatusParseError,
    SubjectError,
};

/// Any domain validation failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Subject(#[from] SubjectError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Status(#[from] StatusParseError),
}
