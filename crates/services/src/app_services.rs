use std::sync::Arc;

use quiz_core::model::{LearnerId, QuizConfig};
use storage::repository::{LearnerRecord, LearnerRepository, Storage};

use crate::Clock;
use crate::error::AppServicesError;
use crate::instructor_service::InstructorService;
use crate::question_source::{QuestionSource, RemoteQuestionSource, RepositorySource};
use crate::quiz::QuizLoopService;

/// Default display name for a learner created on first launch.
pub const DEFAULT_LEARNER_NAME: &str = "Learner";

/// Assembles app-facing services and resolves a usable learner id.
#[derive(Clone)]
pub struct AppServices {
    learner_id: LearnerId,
    created_learner: bool,
    quiz_loop: Arc<QuizLoopService>,
    instructor: Arc<InstructorService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// Questions come from `questions_url` when given, otherwise from the database.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or default learner setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        preferred_learner: LearnerId,
        questions_url: Option<&str>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(
            storage,
            clock,
            QuizConfig::default(),
            preferred_learner,
            questions_url,
        )
        .await
    }

    /// Build services over an already-initialized storage aggregate.
    ///
    /// The quiz and the instructor report share `config`, so recorded and reported
    /// ranks come from the same ladder.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if default learner setup fails.
    pub async fn from_storage(
        storage: Storage,
        clock: Clock,
        config: QuizConfig,
        preferred_learner: LearnerId,
        questions_url: Option<&str>,
    ) -> Result<Self, AppServicesError> {
        let created_learner =
            ensure_default_learner(storage.learners.as_ref(), preferred_learner).await?;

        let source: Arc<dyn QuestionSource> = match questions_url {
            Some(url) => Arc::new(RemoteQuestionSource::new(url)),
            None => Arc::new(RepositorySource::new(Arc::clone(&storage.questions))),
        };
        let instructor = Arc::new(
            InstructorService::new(Arc::clone(&storage.questions), Arc::clone(&storage.learners))
                .with_rank_table(config.rank_table().clone()),
        );
        let quiz_loop = Arc::new(
            QuizLoopService::new(clock, source, Arc::clone(&storage.learners)).with_config(config),
        );

        Ok(Self {
            learner_id: preferred_learner,
            created_learner,
            quiz_loop,
            instructor,
        })
    }

    #[must_use]
    pub fn learner_id(&self) -> LearnerId {
        self.learner_id
    }

    /// True when the learner did not exist and was created on this launch.
    #[must_use]
    pub fn created_learner(&self) -> bool {
        self.created_learner
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn instructor(&self) -> Arc<InstructorService> {
        Arc::clone(&self.instructor)
    }
}

async fn ensure_default_learner(
    learners: &dyn LearnerRepository,
    id: LearnerId,
) -> Result<bool, AppServicesError> {
    if learners.get_learner(id).await?.is_some() {
        return Ok(false);
    }

    learners
        .upsert_learner(&LearnerRecord::new(id, DEFAULT_LEARNER_NAME))
        .await?;
    tracing::info!(learner = %id, "created default learner");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{RankEntry, RankTable};

    #[tokio::test]
    async fn creates_missing_learner_once() {
        let storage = Storage::in_memory();
        let id = LearnerId::new(3);

        let first =
            AppServices::from_storage(storage.clone(), Clock::default(), QuizConfig::default(), id, None)
                .await
                .unwrap();
        assert!(first.created_learner());
        assert_eq!(first.learner_id(), id);

        let second =
            AppServices::from_storage(storage.clone(), Clock::default(), QuizConfig::default(), id, None)
                .await
                .unwrap();
        assert!(!second.created_learner());

        let learner = storage.learners.get_learner(id).await.unwrap().unwrap();
        assert_eq!(learner.name, DEFAULT_LEARNER_NAME);
        assert_eq!(learner.score, 0);
    }

    #[tokio::test]
    async fn quiz_and_report_share_the_configured_ladder() {
        let ladder = RankTable::new(vec![
            RankEntry::new(0, "Novice"),
            RankEntry::new(1, "Graduate"),
        ])
        .unwrap();
        let config = QuizConfig::new(20, ladder).unwrap();
        let storage = Storage::in_memory();
        let id = LearnerId::new(1);

        let services = AppServices::from_storage(storage.clone(), Clock::default(), config, id, None)
            .await
            .unwrap();
        assert_eq!(
            services.quiz_loop().config().rank_table().rank_for(1).label,
            "Graduate"
        );

        storage.learners.record_attempt(id, 1, "Graduate").await.unwrap();
        let report = services.instructor().learner_report().await.unwrap();
        assert_eq!(report[0].progress.current.label, "Graduate");
        assert!(report[0].progress.next.is_none());
    }
}
