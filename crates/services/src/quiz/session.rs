use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use quiz_core::model::{AttemptSummary, Question, QuizConfig, RevealedFeedback};
use quiz_core::{Clock, CountdownTimer, TickOutcome, TimerToken};

use super::progress::QuizProgress;
use super::selector::{QuestionSelector, theme_filter};
use crate::error::QuizError;

//
// ─── PHASE & EVENTS ────────────────────────────────────────────────────────────
//

/// Discrete state of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No attempt running.
    Idle,
    /// A question is shown and the countdown is running.
    AnswerPending,
    /// The current question was scored and its feedback is shown.
    Revealed,
    /// Every question of the attempt was answered.
    Completed,
}

/// Result of delivering one timer tick to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickEvent {
    /// Stale or out-of-phase tick. Nothing changed.
    Ignored,
    /// Countdown still running.
    Counting { remaining: u32 },
    /// Time ran out and the current question was scored with whatever was selected.
    Expired(RevealedFeedback),
}

/// Result of `advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the next question; ticks must carry `token`.
    Next { position: usize, token: TimerToken },
    /// The attempt finished.
    Completed(AttemptSummary),
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Mutable state of one attempt. Replaced wholesale when a new attempt starts.
#[derive(Debug, Clone)]
struct SessionState {
    phase: Phase,
    ordering: Vec<Question>,
    position: usize,
    selected_option: Option<usize>,
    score: u32,
    starting_score: u32,
    correct: u32,
    theme: Option<String>,
    started_at: Option<DateTime<Utc>>,
    revealed: Option<RevealedFeedback>,
    summary: Option<AttemptSummary>,
}

impl SessionState {
    fn idle(score: u32) -> Self {
        Self {
            phase: Phase::Idle,
            ordering: Vec::new(),
            position: 0,
            selected_option: None,
            score,
            starting_score: score,
            correct: 0,
            theme: None,
            started_at: None,
            revealed: None,
            summary: None,
        }
    }

    fn current(&self) -> Option<&Question> {
        match self.phase {
            Phase::AnswerPending | Phase::Revealed => self.ordering.get(self.position),
            Phase::Idle | Phase::Completed => None,
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State machine driving timed quiz attempts for one learner.
///
/// The learner's cumulative score is seeded at construction and carried from one
/// attempt into the next. Events run to completion one at a time; the countdown is
/// advanced by the caller through `tick`.
pub struct QuizSession {
    config: QuizConfig,
    clock: Clock,
    selector: QuestionSelector,
    bank: Arc<[Question]>,
    timer: CountdownTimer,
    state: SessionState,
}

impl QuizSession {
    /// Create an idle session over a snapshot of `bank`.
    #[must_use]
    pub fn new(bank: Vec<Question>, initial_score: u32) -> Self {
        Self {
            config: QuizConfig::default(),
            clock: Clock::default(),
            selector: QuestionSelector::from_entropy(),
            bank: bank.into(),
            timer: CountdownTimer::new(),
            state: SessionState::idle(initial_score),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: QuizConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_selector(mut self, selector: QuestionSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Swap the question bank used by later attempts.
    ///
    /// A running attempt keeps the ordering it started with.
    pub fn replace_bank(&mut self, bank: Vec<Question>) {
        self.bank = bank.into();
    }

    // ─── Accessors ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.state.score
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.state.position
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.state.ordering.len()
    }

    /// Questions later attempts are drawn from.
    #[must_use]
    pub fn bank(&self) -> &[Question] {
        &self.bank
    }

    #[must_use]
    pub fn ordering(&self) -> &[Question] {
        &self.state.ordering
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.state.current()
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<usize> {
        self.state.selected_option
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.timer.remaining()
    }

    /// Token the driver must attach to ticks for the current question.
    #[must_use]
    pub fn timer_token(&self) -> Option<TimerToken> {
        self.timer.token()
    }

    /// Feedback for the current question once it was scored.
    #[must_use]
    pub fn revealed(&self) -> Option<&RevealedFeedback> {
        self.state.revealed.as_ref()
    }

    /// Summary of the last attempt, once completed.
    #[must_use]
    pub fn summary(&self) -> Option<&AttemptSummary> {
        self.state.summary.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let total = self.state.ordering.len();
        let answered = match self.state.phase {
            Phase::Idle => 0,
            Phase::AnswerPending => self.state.position,
            Phase::Revealed => self.state.position + 1,
            Phase::Completed => total,
        };
        QuizProgress {
            total,
            answered,
            remaining: total - answered,
            is_complete: self.state.phase == Phase::Completed,
        }
    }

    // ─── Events ───────────────────────────────────────────────────────────────

    /// Begin a new attempt filtered by `theme` (`None` or `"all"` for the whole bank).
    ///
    /// From `Completed` a brand-new attempt state is created, carrying the score.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptySelection` if no question matches; the session is
    /// left `Idle` and another theme may be tried.
    /// Returns `QuizError::InvalidTransition` while an attempt is in progress.
    pub fn start_attempt(&mut self, theme: Option<&str>) -> Result<TimerToken, QuizError> {
        match self.state.phase {
            Phase::Idle => {}
            Phase::Completed => self.state = SessionState::idle(self.state.score),
            phase => {
                return Err(QuizError::InvalidTransition {
                    event: "start_attempt",
                    phase,
                });
            }
        }

        let ordering = self.selector.select(&self.bank, theme)?;
        let mut next = SessionState::idle(self.state.score);
        next.phase = Phase::AnswerPending;
        next.ordering = ordering;
        next.theme = theme_filter(theme).map(ToString::to_string);
        next.started_at = Some(self.clock.now());
        self.state = next;

        tracing::info!(
            theme = ?self.state.theme,
            questions = self.state.ordering.len(),
            score = self.state.score,
            "quiz attempt started"
        );
        Ok(self.timer.start(self.config.question_seconds()))
    }

    /// Highlight an option for the current question without scoring it.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidTransition` outside `AnswerPending`.
    /// Returns `QuizError::OutOfRangeOption` if `index` is not an option of the current question.
    pub fn choose(&mut self, index: usize) -> Result<(), QuizError> {
        let question = self.pending_question("choose")?;
        let len = question.options().len();
        if index >= len {
            return Err(QuizError::OutOfRangeOption { index, len });
        }
        self.state.selected_option = Some(index);
        Ok(())
    }

    /// Confirm the selected option, score it and reveal the feedback.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidTransition` outside `AnswerPending`, which includes a
    /// second submit for the same question.
    /// Returns `QuizError::NoOptionSelected` if nothing was chosen yet.
    pub fn submit(&mut self) -> Result<&RevealedFeedback, QuizError> {
        self.pending_question("submit")?;
        if self.state.selected_option.is_none() {
            return Err(QuizError::NoOptionSelected);
        }
        self.timer.cancel();
        Ok(self.score_current())
    }

    /// Deliver one countdown tick carrying `token`.
    ///
    /// Ticks for an earlier question, a cancelled timer, or a phase other than
    /// `AnswerPending` are ignored.
    pub fn tick(&mut self, token: TimerToken) -> TickEvent {
        if self.state.phase != Phase::AnswerPending {
            tracing::debug!(phase = ?self.state.phase, "ignoring tick outside AnswerPending");
            return TickEvent::Ignored;
        }
        match self.timer.tick(token) {
            TickOutcome::Ignored => {
                tracing::debug!(token = token.generation(), "ignoring stale tick");
                TickEvent::Ignored
            }
            TickOutcome::Running { remaining } => TickEvent::Counting { remaining },
            TickOutcome::Expired => {
                tracing::debug!(position = self.state.position, "question timed out");
                TickEvent::Expired(self.score_current().clone())
            }
        }
    }

    /// Move past the revealed question, finishing the attempt after the last one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidTransition` outside `Revealed`.
    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        if self.state.phase != Phase::Revealed {
            return Err(QuizError::InvalidTransition {
                event: "advance",
                phase: self.state.phase,
            });
        }

        let next = self.state.position + 1;
        if next < self.state.ordering.len() {
            self.state.position = next;
            self.state.selected_option = None;
            self.state.revealed = None;
            self.state.phase = Phase::AnswerPending;
            let token = self.timer.start(self.config.question_seconds());
            return Ok(Advance::Next {
                position: next,
                token,
            });
        }

        self.timer.cancel();
        let summary = self.build_summary()?;
        self.state.phase = Phase::Completed;
        self.state.revealed = None;
        self.state.summary = Some(summary.clone());

        tracing::info!(
            score = summary.final_score(),
            correct = summary.correct(),
            total = summary.total_questions(),
            rank = %summary.rank().label,
            "quiz attempt completed"
        );
        Ok(Advance::Completed(summary))
    }

    /// Abandon the running attempt, if any.
    ///
    /// Points of an unfinished attempt are discarded; the score falls back to the
    /// value the attempt started from. A completed attempt keeps its final score.
    pub fn leave(&mut self) {
        self.timer.cancel();
        let score = match self.state.phase {
            Phase::Idle | Phase::Completed => self.state.score,
            Phase::AnswerPending | Phase::Revealed => {
                tracing::debug!(
                    phase = ?self.state.phase,
                    discarded = self.state.score - self.state.starting_score,
                    "leaving unfinished attempt"
                );
                self.state.starting_score
            }
        };
        self.state = SessionState::idle(score);
    }

    // ─── Internals ────────────────────────────────────────────────────────────

    fn pending_question(&self, event: &'static str) -> Result<&Question, QuizError> {
        match self.state.phase {
            Phase::AnswerPending => self.state.current().ok_or(QuizError::InvalidTransition {
                event,
                phase: self.state.phase,
            }),
            phase => Err(QuizError::InvalidTransition { event, phase }),
        }
    }

    /// Score the current question once and move to `Revealed`.
    ///
    /// Callers guarantee the phase is `AnswerPending`.
    fn score_current(&mut self) -> &RevealedFeedback {
        let question = &self.state.ordering[self.state.position];
        let revealed = question.reveal(self.state.selected_option);
        if revealed.correct {
            self.state.score = self.state.score.saturating_add(1);
            self.state.correct += 1;
        }
        self.state.phase = Phase::Revealed;
        self.state.revealed.insert(revealed)
    }

    fn build_summary(&self) -> Result<AttemptSummary, QuizError> {
        let rank = self.config.rank_table().rank_for(self.state.score).clone();
        let completed_at = self.clock.now();
        let total = u32::try_from(self.state.ordering.len()).unwrap_or(u32::MAX);
        Ok(AttemptSummary::new(
            self.state.theme.clone(),
            total,
            self.state.correct,
            self.state.starting_score,
            self.state.score,
            rank,
            self.state.started_at.unwrap_or(completed_at),
            completed_at,
        )?)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("phase", &self.state.phase)
            .field("ordering_len", &self.state.ordering.len())
            .field("position", &self.state.position)
            .field("selected_option", &self.state.selected_option)
            .field("score", &self.state.score)
            .field("remaining_seconds", &self.timer.remaining())
            .field("bank_len", &self.bank.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
