//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{AttemptSummaryError, QuestionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::quiz::Phase;

/// Errors emitted by the quiz state machine.
///
/// All of them are recoverable and leave the session state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no questions match theme {theme:?}")]
    EmptySelection { theme: Option<String> },
    #[error("`{event}` is not valid while the session is {phase:?}")]
    InvalidTransition { event: &'static str, phase: Phase },
    #[error("option {index} is out of range for a question with {len} options")]
    OutOfRangeOption { index: usize, len: usize },
    #[error("no option selected")]
    NoOptionSelected,
    #[error(transparent)]
    Summary(#[from] AttemptSummaryError),
}

/// Errors emitted while fetching the question bank.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionSourceError {
    #[error("question bank request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `InstructorService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstructorError {
    #[error("question {index} in the uploaded set is invalid: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },
    #[error("uploaded question set is empty")]
    EmptyUpload,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while assembling `AppServices`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
