use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::RankEntry;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("correct answers ({correct}) exceed question count ({total})")]
    TooManyCorrect { correct: u32, total: u32 },

    #[error("final score ({final_score}) does not equal starting score plus correct answers ({expected})")]
    ScoreMismatch { final_score: u32, expected: u32 },
}

/// Outcome of one completed attempt, handed to the score store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptSummary {
    theme: Option<String>,
    total_questions: u32,
    correct: u32,
    starting_score: u32,
    final_score: u32,
    rank: RankEntry,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl AttemptSummary {
    /// Build a summary for a finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `AttemptSummaryError` if the counts or timestamps are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        theme: Option<String>,
        total_questions: u32,
        correct: u32,
        starting_score: u32,
        final_score: u32,
        rank: RankEntry,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, AttemptSummaryError> {
        if completed_at < started_at {
            return Err(AttemptSummaryError::InvalidTimeRange);
        }
        if correct > total_questions {
            return Err(AttemptSummaryError::TooManyCorrect {
                correct,
                total: total_questions,
            });
        }
        let expected = starting_score.saturating_add(correct);
        if final_score != expected {
            return Err(AttemptSummaryError::ScoreMismatch {
                final_score,
                expected,
            });
        }

        Ok(Self {
            theme,
            total_questions,
            correct,
            starting_score,
            final_score,
            rank,
            started_at,
            completed_at,
        })
    }

    /// Theme filter the attempt was started with; `None` means the whole bank.
    #[must_use]
    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.total_questions - self.correct
    }

    #[must_use]
    pub fn starting_score(&self) -> u32 {
        self.starting_score
    }

    #[must_use]
    pub fn final_score(&self) -> u32 {
        self.final_score
    }

    #[must_use]
    pub fn rank(&self) -> &RankEntry {
        &self.rank
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
