use async_trait::async_trait;
use chrono::Utc;
use quiz_core::model::LearnerId;

use super::SqliteRepository;
use super::mapping::{learner_id_to_i64, map_learner_row};
use crate::repository::{LearnerRecord, LearnerRepository, StorageError};

#[async_trait]
impl LearnerRepository for SqliteRepository {
    async fn upsert_learner(&self, learner: &LearnerRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO learners (id, name, score, rank, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                score = excluded.score,
                rank = excluded.rank,
                updated_at = excluded.updated_at
            ",
        )
        .bind(learner_id_to_i64(learner.id)?)
        .bind(learner.name.as_str())
        .bind(i64::from(learner.score))
        .bind(learner.rank.as_deref())
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_learner(&self, id: LearnerId) -> Result<Option<LearnerRecord>, StorageError> {
        let row = sqlx::query("SELECT id, name, score, rank FROM learners WHERE id = ?1")
            .bind(learner_id_to_i64(id)?)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_learner_row).transpose()
    }

    async fn record_attempt(
        &self,
        id: LearnerId,
        score: u32,
        rank_label: &str,
    ) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE learners
            SET score = ?2, rank = ?3, updated_at = ?4
            WHERE id = ?1
            ",
        )
        .bind(learner_id_to_i64(id)?)
        .bind(i64::from(score))
        .bind(rank_label)
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_learners(&self) -> Result<Vec<LearnerRecord>, StorageError> {
        let rows = sqlx::query("SELECT id, name, score, rank FROM learners ORDER BY id ASC")
            .fetch_all(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_learner_row).collect()
    }
}
