use std::sync::Arc;

use quiz_core::model::{LearnerId, Question, QuizConfig};
use storage::fallback::demo_questions;
use storage::repository::{LearnerRepository, distinct_themes};

use super::selector::QuestionSelector;
use super::session::{Advance, QuizSession};
use crate::Clock;
use crate::error::{QuizError, QuizServiceError};
use crate::question_source::QuestionSource;

/// Result of advancing a session through the loop service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizStep {
    pub advance: Advance,
    /// Whether the final score was written to the learner store on this step.
    pub recorded: bool,
}

/// Orchestrates bank loading, score seeding and completion persistence.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    config: QuizConfig,
    source: Arc<dyn QuestionSource>,
    learners: Arc<dyn LearnerRepository>,
    seed: Option<u64>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        source: Arc<dyn QuestionSource>,
        learners: Arc<dyn LearnerRepository>,
    ) -> Self {
        Self {
            clock,
            config: QuizConfig::default(),
            source,
            learners,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: QuizConfig) -> Self {
        self.config = config;
        self
    }

    /// Pin the shuffle of every session opened by this service.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// Fetch the question bank, falling back to the built-in set if the source fails.
    ///
    /// An empty bank is returned as-is; starting an attempt on it reports an empty selection.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Question` only if the built-in set is malformed.
    pub async fn load_bank(&self) -> Result<Vec<Question>, QuizServiceError> {
        match self.source.fetch_bank().await {
            Ok(bank) => {
                tracing::debug!(questions = bank.len(), "question bank loaded");
                Ok(bank)
            }
            Err(err) => {
                tracing::warn!(error = %err, "question bank unavailable, using demonstration set");
                Ok(demo_questions()?)
            }
        }
    }

    /// Distinct themes of the current bank, in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError` if the bank cannot be loaded.
    pub async fn themes(&self) -> Result<Vec<String>, QuizServiceError> {
        let bank = self.load_bank().await?;
        Ok(distinct_themes(&bank))
    }

    /// Open an idle session for `learner`, seeded with their stored score.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the learner is unknown or the store fails.
    pub async fn open_session(&self, learner: LearnerId) -> Result<QuizSession, QuizServiceError> {
        let score = self.learners.initial_score(learner).await?;
        let bank = self.load_bank().await?;
        let selector = self
            .seed
            .map_or_else(QuestionSelector::from_entropy, QuestionSelector::seeded);

        tracing::info!(%learner, score, questions = bank.len(), "quiz session opened");
        Ok(QuizSession::new(bank, score)
            .with_config(self.config.clone())
            .with_clock(self.clock)
            .with_selector(selector))
    }

    /// Reload the bank into `session` for its next attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError` if the bank cannot be loaded.
    pub async fn refresh_bank(&self, session: &mut QuizSession) -> Result<(), QuizServiceError> {
        let bank = self.load_bank().await?;
        session.replace_bank(bank);
        Ok(())
    }

    /// Advance past the revealed question and persist the score once the attempt completes.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` for an invalid transition.
    /// Returns `QuizServiceError::Storage` if the completed score cannot be stored; the
    /// session stays completed and `record_completion` may be retried.
    pub async fn advance(
        &self,
        learner: LearnerId,
        session: &mut QuizSession,
    ) -> Result<QuizStep, QuizServiceError> {
        let advance = session.advance()?;
        let recorded = match &advance {
            Advance::Completed(_) => {
                self.record_completion(learner, session).await?;
                true
            }
            Advance::Next { .. } => false,
        };
        Ok(QuizStep { advance, recorded })
    }

    /// Store the final score and rank of a completed attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` if the session has no completed attempt.
    /// Returns `QuizServiceError::Storage` if persistence fails.
    pub async fn record_completion(
        &self,
        learner: LearnerId,
        session: &QuizSession,
    ) -> Result<(), QuizServiceError> {
        let summary = session.summary().ok_or(QuizError::InvalidTransition {
            event: "record_completion",
            phase: session.phase(),
        })?;
        self.learners
            .record_attempt(learner, summary.final_score(), &summary.rank().label)
            .await?;
        tracing::info!(
            %learner,
            score = summary.final_score(),
            rank = %summary.rank().label,
            "attempt recorded"
        );
        Ok(())
    }
}
