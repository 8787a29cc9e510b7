use quiz_core::model::{Feedback, LearnerId, Question};
use sqlx::Row;

use crate::repository::{LearnerRecord, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn learner_id_to_i64(id: LearnerId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("learner_id overflow".into()))
}

pub(crate) fn learner_id_from_i64(v: i64) -> Result<LearnerId, StorageError> {
    u64::try_from(v)
        .map(LearnerId::new)
        .map_err(|_| StorageError::Serialization("learner_id sign overflow".into()))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range")))
}

pub(crate) fn options_to_json(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let options_json: String = row.try_get("options").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_json).map_err(ser)?;
    let correct: i64 = row.try_get("correct_option_index").map_err(ser)?;
    let correct = usize::try_from(correct)
        .map_err(|_| StorageError::Serialization("correct_option_index sign overflow".into()))?;

    let feedback = Feedback::new(
        row.try_get::<String, _>("feedback_title").map_err(ser)?,
        row.try_get::<String, _>("feedback_text").map_err(ser)?,
        row.try_get::<Option<String>, _>("illustration_ref")
            .map_err(ser)?,
    );

    Question::from_persisted(
        row.try_get("id").map_err(ser)?,
        row.try_get("theme").map_err(ser)?,
        row.try_get("prompt").map_err(ser)?,
        options,
        correct,
        feedback,
    )
    .map_err(ser)
}

pub(crate) fn map_learner_row(row: &sqlx::sqlite::SqliteRow) -> Result<LearnerRecord, StorageError> {
    Ok(LearnerRecord {
        id: learner_id_from_i64(row.try_get("id").map_err(ser)?)?,
        name: row.try_get("name").map_err(ser)?,
        score: u32_from_i64("score", row.try_get("score").map_err(ser)?)?,
        rank: row.try_get("rank").map_err(ser)?,
    })
}
