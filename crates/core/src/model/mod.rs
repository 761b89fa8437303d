mod answer;
mod ids;
mod ledger;
mod progress;
pub mod question;
mod stats;
mod subject;

pub use ids::{IdError, QuestionId};
pub use subject::{CatalogError, Subject, SubjectCatalog, SubjectError, SubjectInfo};

pub use answer::{AnswerError, AnswerRecord, OPTION_COUNT, OptionIndex, Outcome};
pub use ledger::{AnswerLedger, SubjectAnswers};
pub use progress::{
    CounterDrift, CounterTransition, OverallProgress, ProgressBook, ProgressError,
    SubjectProgress, rounded_percent,
};
pub use question::{Passage, PassageTable, Question, QuestionError};
pub use stats::{AnswerStatus, QuestionStats, StatusParseError, filter_by_status};
