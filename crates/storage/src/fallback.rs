//! Built-in demonstration questions, used when the question bank is unreachable.

use quiz_core::model::{Feedback, Question, QuestionDraft, QuestionError};

/// Returns the demonstration question set.
///
/// # Errors
///
/// Returns `QuestionError` only if the built-in data is malformed.
pub fn demo_questions() -> Result<Vec<Question>, QuestionError> {
    demo_drafts()
        .into_iter()
        .map(QuestionDraft::validate)
        .collect()
}

fn demo_drafts() -> Vec<QuestionDraft> {
    vec![
        QuestionDraft {
            id: "mock1".into(),
            theme: "capoeira".into(),
            prompt: "Which instrument leads the capoeira roda?".into(),
            options: vec![
                "Berimbau".into(),
                "Pandeiro".into(),
                "Atabaque".into(),
                "Caxixi".into(),
            ],
            correct_option_index: 0,
            feedback: Feedback::new(
                "Correct!",
                "The berimbau is the main instrument and sets the pace of the roda.",
                None,
            ),
        },
        QuestionDraft {
            id: "mock2".into(),
            theme: "tecnologia".into(),
            prompt: "What does HTML stand for?".into(),
            options: vec![
                "HyperText Markup Language".into(),
                "Home Tool Markup Language".into(),
                "Hyperlinks and Text Markup Language".into(),
                "High Tech Modern Language".into(),
            ],
            correct_option_index: 0,
            feedback: Feedback::new(
                "Well done!",
                "HTML is the standard markup language for web pages.",
                None,
            ),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_set_is_valid_and_covers_two_themes() {
        let questions = demo_questions().unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].theme(), "capoeira");
        assert_eq!(questions[1].theme(), "tecnologia");
    }
}
