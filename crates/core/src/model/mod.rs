mod attempt;
mod config;
mod ids;
mod question;
mod rank;

pub use attempt::{AttemptSummary, AttemptSummaryError};
pub use config::{ConfigError, DEFAULT_QUESTION_SECONDS, QuizConfig};
pub use ids::{IdError, LearnerId, QuestionId};
pub use question::{Feedback, Question, QuestionDraft, QuestionError, RevealedFeedback};
pub use rank::{RankEntry, RankProgress, RankTable, RankTableError};
