use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{IdError, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error(transparent)]
    InvalidId(#[from] IdError),

    #[error("question theme cannot be empty")]
    EmptyTheme,

    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("a question needs at least 2 options, got {len}")]
    TooFewOptions { len: usize },

    #[error("option {index} cannot be empty")]
    EmptyOption { index: usize },

    #[error("correct option index {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },
}

//
// ─── FEEDBACK ──────────────────────────────────────────────────────────────────
//

const CORRECT_TITLE: &str = "Correct!";
const CORRECT_TEXT: &str = "Good answer!";
const INCORRECT_TITLE: &str = "Not this time!";

/// Explanation attached to a question and shown once it has been answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "illustration", skip_serializing_if = "Option::is_none")]
    pub illustration_ref: Option<String>,
}

impl Feedback {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        illustration_ref: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            illustration_ref,
        }
        .normalized()
    }

    /// Blank illustration references mean "no illustration".
    fn normalized(mut self) -> Self {
        self.illustration_ref = self
            .illustration_ref
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }
}

/// What the learner sees after a question was scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedFeedback {
    pub correct: bool,
    pub selected_option: Option<usize>,
    pub correct_option_index: usize,
    pub correct_option: String,
    pub title: String,
    pub text: String,
    pub illustration_ref: Option<String>,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it arrives from an instructor upload or the remote bank.
///
/// Field names follow the bank's JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: String,
    pub theme: String,
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option_index: usize,
    #[serde(default)]
    pub feedback: Feedback,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// Prompt and id are trimmed. The theme is an opaque label and is kept verbatim,
    /// as are the options and their order.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` describing the first invalid field.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = QuestionId::new(self.id)?;

        if self.theme.trim().is_empty() {
            return Err(QuestionError::EmptyTheme);
        }
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        let len = self.options.len();
        if len < 2 {
            return Err(QuestionError::TooFewOptions { len });
        }
        if let Some(index) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { index });
        }
        if self.correct_option_index >= len {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: self.correct_option_index,
                len,
            });
        }

        Ok(Question {
            id,
            theme: self.theme,
            prompt: prompt.to_string(),
            options: self.options,
            correct_option_index: self.correct_option_index,
            feedback: self.feedback.normalized(),
        })
    }
}

/// A multiple-choice question supplied by the question bank.
///
/// Invariant: `correct_option_index < options.len()` and `options.len() >= 2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    theme: String,
    prompt: String,
    options: Vec<String>,
    correct_option_index: usize,
    feedback: Feedback,
}

impl Question {
    /// Rehydrate a question from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the stored row violates question invariants.
    pub fn from_persisted(
        id: String,
        theme: String,
        prompt: String,
        options: Vec<String>,
        correct_option_index: usize,
        feedback: Feedback,
    ) -> Result<Self, QuestionError> {
        QuestionDraft {
            id,
            theme,
            prompt,
            options,
            correct_option_index,
            feedback,
        }
        .validate()
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn theme(&self) -> &str {
        &self.theme
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn correct_option_index(&self) -> usize {
        self.correct_option_index
    }

    #[must_use]
    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    #[must_use]
    pub fn is_correct(&self, selected: Option<usize>) -> bool {
        selected == Some(self.correct_option_index)
    }

    /// Build the feedback shown after this question was scored with `selected`.
    #[must_use]
    pub fn reveal(&self, selected: Option<usize>) -> RevealedFeedback {
        let correct = self.is_correct(selected);
        let correct_option = self.options[self.correct_option_index].clone();
        let feedback_text = self.feedback.text.trim();

        let (title, text) = if correct {
            let title = non_blank_or(&self.feedback.title, CORRECT_TITLE);
            let text = non_blank_or(&self.feedback.text, CORRECT_TEXT);
            (title, text)
        } else {
            let mut text = format!("The correct answer was: \"{correct_option}\".");
            if !feedback_text.is_empty() {
                text.push(' ');
                text.push_str(feedback_text);
            }
            (INCORRECT_TITLE.to_string(), text)
        };

        RevealedFeedback {
            correct,
            selected_option: selected,
            correct_option_index: self.correct_option_index,
            correct_option,
            title,
            text,
            illustration_ref: self.feedback.illustration_ref.clone(),
        }
    }
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
