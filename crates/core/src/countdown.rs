//
// ─── TOKEN ─────────────────────────────────────────────────────────────────────
//

/// Identifies one run of the countdown.
///
/// Every `start` hands out a fresh token. Ticks carrying an older token belong to a
/// question the learner no longer sees and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

impl TimerToken {
    #[must_use]
    pub fn generation(self) -> u64 {
        self.0
    }
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Result of delivering one tick to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick was stale, or the timer is not running. Nothing changed.
    Ignored,
    /// The timer is still running with this many seconds left.
    Running { remaining: u32 },
    /// Time ran out. Reported exactly once per run.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Stopped,
    Running,
}

//
// ─── TIMER ─────────────────────────────────────────────────────────────────────
//

/// Per-question countdown driven by one tick per wall-clock second.
///
/// The timer owns no thread or callback; the caller delivers ticks and reacts to
/// `TickOutcome::Expired`.
///
/// # Examples
///
/// ```
/// # use quiz_core::{CountdownTimer, TickOutcome};
/// let mut timer = CountdownTimer::new();
/// let token = timer.start(1);
/// assert_eq!(timer.tick(token), TickOutcome::Running { remaining: 0 });
/// assert_eq!(timer.tick(token), TickOutcome::Expired);
/// assert_eq!(timer.tick(token), TickOutcome::Ignored);
/// ```
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    remaining: u32,
    state: TimerState,
    generation: u64,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownTimer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            remaining: 0,
            state: TimerState::Stopped,
            generation: 0,
        }
    }

    /// Start a fresh run with the full `duration_secs`.
    ///
    /// Any previous run is cancelled first, so its token stops matching.
    pub fn start(&mut self, duration_secs: u32) -> TimerToken {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        self.remaining = duration_secs;
        self.state = TimerState::Running;
        TimerToken(self.generation)
    }

    /// Deliver one tick.
    ///
    /// Decrements the remaining time; when the decrement would go below zero the
    /// timer stops and reports `Expired`.
    pub fn tick(&mut self, token: TimerToken) -> TickOutcome {
        if !self.accepts(token) {
            return TickOutcome::Ignored;
        }
        match self.remaining.checked_sub(1) {
            Some(remaining) => {
                self.remaining = remaining;
                TickOutcome::Running { remaining }
            }
            None => {
                self.state = TimerState::Stopped;
                TickOutcome::Expired
            }
        }
    }

    /// Stop the current run. Later ticks for it are ignored.
    pub fn cancel(&mut self) {
        self.state = TimerState::Stopped;
        // Outstanding tokens stop matching.
        self.generation = self.generation.wrapping_add(1);
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Token of the current run, if the timer is running.
    #[must_use]
    pub fn token(&self) -> Option<TimerToken> {
        self.is_running().then_some(TimerToken(self.generation))
    }

    fn accepts(&self, token: TimerToken) -> bool {
        self.is_running() && token.0 == self.generation
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
