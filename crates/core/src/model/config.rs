use thiserror::Error;

use crate::model::RankTable;

/// Seconds a learner gets per question unless configured otherwise.
pub const DEFAULT_QUESTION_SECONDS: u32 = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("question time must be > 0 seconds")]
    InvalidQuestionSeconds,
}

/// Settings that shape a quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
    question_seconds: u32,
    rank_table: RankTable,
}

impl QuizConfig {
    /// Creates custom quiz settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidQuestionSeconds` if `question_seconds` is zero.
    pub fn new(question_seconds: u32, rank_table: RankTable) -> Result<Self, ConfigError> {
        if question_seconds == 0 {
            return Err(ConfigError::InvalidQuestionSeconds);
        }
        Ok(Self {
            question_seconds,
            rank_table,
        })
    }

    #[must_use]
    pub fn question_seconds(&self) -> u32 {
        self.question_seconds
    }

    #[must_use]
    pub fn rank_table(&self) -> &RankTable {
        &self.rank_table
    }
}

impl Default for QuizConfig {
    /// 20 seconds per question on the default cord ladder.
    fn default() -> Self {
        Self {
            question_seconds: DEFAULT_QUESTION_SECONDS,
            rank_table: RankTable::default(),
        }
    }
}
