use async_trait::async_trait;
use quiz_core::model::{Question, QuestionId};

use super::SqliteRepository;
use super::mapping::{map_question_row, options_to_json};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait]
impl QuestionRepository for SqliteRepository {
    async fn fetch_questions(&self) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, theme, prompt, options, correct_option_index, feedback_title, feedback_text, illustration_ref
            FROM questions
            ORDER BY rowid ASC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_question_row).collect()
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let correct = i64::try_from(question.correct_option_index())
            .map_err(|_| StorageError::Serialization("correct_option_index overflow".into()))?;
        let feedback = question.feedback();

        sqlx::query(
            r"
            INSERT INTO questions (id, theme, prompt, options, correct_option_index, feedback_title, feedback_text, illustration_ref)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                theme = excluded.theme,
                prompt = excluded.prompt,
                options = excluded.options,
                correct_option_index = excluded.correct_option_index,
                feedback_title = excluded.feedback_title,
                feedback_text = excluded.feedback_text,
                illustration_ref = excluded.illustration_ref
            ",
        )
        .bind(question.id().as_str())
        .bind(question.theme())
        .bind(question.prompt())
        .bind(options_to_json(question.options())?)
        .bind(correct)
        .bind(feedback.title.as_str())
        .bind(feedback.text.as_str())
        .bind(feedback.illustration_ref.as_deref())
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn delete_question(&self, id: &QuestionId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(id.as_str())
            .execute(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_themes(&self) -> Result<Vec<String>, StorageError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r"
            SELECT theme FROM questions
            GROUP BY theme
            ORDER BY MIN(rowid) ASC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(rows.into_iter().map(|(theme,)| theme).collect())
    }
}
