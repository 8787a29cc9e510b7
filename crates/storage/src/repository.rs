use async_trait::async_trait;
use quiz_core::model::{LearnerId, Question, QuestionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a learner in the user/score store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerRecord {
    pub id: LearnerId,
    pub name: String,
    pub score: u32,
    /// Rank label recorded with the last completed attempt.
    pub rank: Option<String>,
}

impl LearnerRecord {
    #[must_use]
    pub fn new(id: LearnerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            score: 0,
            rank: None,
        }
    }
}

/// Repository contract for the question bank.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Fetch every question in the bank, in storage order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read.
    async fn fetch_questions(&self) -> Result<Vec<Question>, StorageError>;

    /// Persist or replace a question by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Remove a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no question has this id.
    async fn delete_question(&self, id: &QuestionId) -> Result<(), StorageError>;

    /// Distinct themes in the order they first appear in the bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read.
    async fn list_themes(&self) -> Result<Vec<String>, StorageError> {
        let questions = self.fetch_questions().await?;
        Ok(distinct_themes(&questions))
    }
}

/// Repository contract for learners and their cumulative score.
#[async_trait]
pub trait LearnerRepository: Send + Sync {
    /// Persist or update a learner.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the learner cannot be stored.
    async fn upsert_learner(&self, learner: &LearnerRecord) -> Result<(), StorageError>;

    /// Fetch a learner by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn get_learner(&self, id: LearnerId) -> Result<Option<LearnerRecord>, StorageError>;

    /// Cumulative score a new attempt starts from.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the learner is unknown.
    async fn initial_score(&self, id: LearnerId) -> Result<u32, StorageError> {
        self.get_learner(id)
            .await?
            .map(|learner| learner.score)
            .ok_or(StorageError::NotFound)
    }

    /// Store the score and rank reached at the end of an attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the learner is unknown.
    async fn record_attempt(
        &self,
        id: LearnerId,
        score: u32,
        rank_label: &str,
    ) -> Result<(), StorageError>;

    /// All learners ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn list_learners(&self) -> Result<Vec<LearnerRecord>, StorageError>;
}

#[must_use]
pub fn distinct_themes(questions: &[Question]) -> Vec<String> {
    let mut themes: Vec<String> = Vec::new();
    for question in questions {
        if !themes.iter().any(|t| t == question.theme()) {
            themes.push(question.theme().to_string());
        }
    }
    themes
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<Vec<Question>>>,
    learners: Arc<Mutex<HashMap<LearnerId, LearnerRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            questions: Arc::new(Mutex::new(Vec::new())),
            learners: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Repository pre-filled with `questions`.
    #[must_use]
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions: Arc::new(Mutex::new(questions)),
            learners: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn fetch_questions(&self) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.iter_mut().find(|q| q.id() == question.id()) {
            Some(existing) => *existing = question.clone(),
            None => guard.push(question.clone()),
        }
        Ok(())
    }

    async fn delete_question(&self, id: &QuestionId) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let before = guard.len();
        guard.retain(|q| q.id() != id);
        if guard.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl LearnerRepository for InMemoryRepository {
    async fn upsert_learner(&self, learner: &LearnerRecord) -> Result<(), StorageError> {
        let mut guard = self
            .learners
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(learner.id, learner.clone());
        Ok(())
    }

    async fn get_learner(&self, id: LearnerId) -> Result<Option<LearnerRecord>, StorageError> {
        let guard = self
            .learners
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn record_attempt(
        &self,
        id: LearnerId,
        score: u32,
        rank_label: &str,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .learners
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let learner = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        learner.score = score;
        learner.rank = Some(rank_label.to_string());
        Ok(())
    }

    async fn list_learners(&self) -> Result<Vec<LearnerRecord>, StorageError> {
        let guard = self
            .learners
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut learners: Vec<_> = guard.values().cloned().collect();
        learners.sort_by_key(|l| l.id);
        Ok(learners)
    }
}

/// Aggregates the question bank and learner store behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub learners: Arc<dyn LearnerRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let learners: Arc<dyn LearnerRepository> = Arc::new(repo);
        Self {
            questions,
            learners,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Feedback, QuestionDraft};

    fn build_question(id: &str, theme: &str) -> Question {
        QuestionDraft {
            id: id.into(),
            theme: theme.into(),
            prompt: format!("Prompt {id}"),
            options: vec!["A".into(), "B".into()],
            correct_option_index: 1,
            feedback: Feedback::default(),
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn upsert_replaces_in_place_and_keeps_order() {
        let repo = InMemoryRepository::new();
        repo.upsert_question(&build_question("q1", "history"))
            .await
            .unwrap();
        repo.upsert_question(&build_question("q2", "tech"))
            .await
            .unwrap();
        repo.upsert_question(&build_question("q1", "geography"))
            .await
            .unwrap();

        let all = repo.fetch_questions().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].theme(), "geography");
        assert_eq!(repo.list_themes().await.unwrap(), ["geography", "tech"]);
    }

    #[tokio::test]
    async fn delete_missing_question_is_not_found() {
        let repo = InMemoryRepository::with_questions(vec![build_question("q1", "history")]);
        let missing = QuestionId::new("nope").unwrap();
        assert!(matches!(
            repo.delete_question(&missing).await,
            Err(StorageError::NotFound)
        ));
        repo.delete_question(&QuestionId::new("q1").unwrap())
            .await
            .unwrap();
        assert!(repo.fetch_questions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_attempt_updates_score_and_rank() {
        let repo = InMemoryRepository::new();
        let id = LearnerId::new(7);
        repo.upsert_learner(&LearnerRecord::new(id, "Ana"))
            .await
            .unwrap();
        assert_eq!(repo.initial_score(id).await.unwrap(), 0);

        repo.record_attempt(id, 5, "Graduate").await.unwrap();

        let learner = repo.get_learner(id).await.unwrap().unwrap();
        assert_eq!(learner.score, 5);
        assert_eq!(learner.rank.as_deref(), Some("Graduate"));
        assert!(matches!(
            repo.record_attempt(LearnerId::new(8), 1, "Novice").await,
            Err(StorageError::NotFound)
        ));
        assert!(matches!(
            repo.initial_score(LearnerId::new(8)).await,
            Err(StorageError::NotFound)
        ));
    }
}
