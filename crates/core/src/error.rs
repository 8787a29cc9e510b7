use thiserror::Error;

use crate::model::{AttemptSummaryError, ConfigError, QuestionError, RankTableError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    RankTable(#[from] RankTableError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    AttemptSummary(#[from] AttemptSummaryError),
}
