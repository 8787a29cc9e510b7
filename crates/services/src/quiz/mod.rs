mod progress;
mod selector;
mod session;
mod workflow;

// Public API of the quiz subsystem.
pub use crate::error::QuizError;
pub use progress::QuizProgress;
pub use selector::{QuestionSelector, THEME_ALL, theme_filter};
pub use session::{Advance, Phase, QuizSession, TickEvent};
pub use workflow::{QuizLoopService, QuizStep};
