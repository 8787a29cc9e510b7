use std::sync::Arc;

use quiz_core::model::{
    LearnerId, Question, QuestionDraft, QuestionId, RankProgress, RankTable,
};
use storage::repository::{LearnerRepository, QuestionRepository};

use crate::error::InstructorError;

/// One learner as shown in the instructor's report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerReport {
    pub id: LearnerId,
    pub name: String,
    pub score: u32,
    /// Rank derived from the current ladder, not the label stored with the last attempt.
    pub progress: RankProgress,
}

/// Question-set management and learner review for instructors.
#[derive(Clone)]
pub struct InstructorService {
    questions: Arc<dyn QuestionRepository>,
    learners: Arc<dyn LearnerRepository>,
    ranks: RankTable,
}

impl InstructorService {
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        learners: Arc<dyn LearnerRepository>,
    ) -> Self {
        Self {
            questions,
            learners,
            ranks: RankTable::default(),
        }
    }

    #[must_use]
    pub fn with_rank_table(mut self, ranks: RankTable) -> Self {
        self.ranks = ranks;
        self
    }

    /// Validate and store a question set.
    ///
    /// Nothing is written unless every draft is valid. Existing questions with the
    /// same id are replaced.
    ///
    /// # Errors
    ///
    /// Returns `InstructorError::EmptyUpload` for an empty set.
    /// Returns `InstructorError::InvalidQuestion` for the first invalid draft.
    /// Returns `InstructorError::Storage` on persistence failures.
    pub async fn upload_question_set(
        &self,
        drafts: Vec<QuestionDraft>,
    ) -> Result<Vec<Question>, InstructorError> {
        if drafts.is_empty() {
            return Err(InstructorError::EmptyUpload);
        }

        let questions = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                draft
                    .validate()
                    .map_err(|source| InstructorError::InvalidQuestion { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for question in &questions {
            self.questions.upsert_question(question).await?;
        }
        tracing::info!(count = questions.len(), "question set uploaded");
        Ok(questions)
    }

    /// Remove a question from the bank.
    ///
    /// # Errors
    ///
    /// Returns `InstructorError::Storage` with `StorageError::NotFound` for an unknown id.
    pub async fn delete_question(&self, id: &QuestionId) -> Result<(), InstructorError> {
        self.questions.delete_question(id).await?;
        tracing::info!(question = %id, "question deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `InstructorError::Storage` on persistence failures.
    pub async fn list_questions(&self) -> Result<Vec<Question>, InstructorError> {
        Ok(self.questions.fetch_questions().await?)
    }

    /// Every learner with their score and current rank, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `InstructorError::Storage` on persistence failures.
    pub async fn learner_report(&self) -> Result<Vec<LearnerReport>, InstructorError> {
        let learners = self.learners.list_learners().await?;
        Ok(learners
            .into_iter()
            .map(|learner| LearnerReport {
                id: learner.id,
                name: learner.name,
                score: learner.score,
                progress: self.ranks.progress(learner.score),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Feedback;
    use storage::repository::{InMemoryRepository, LearnerRecord, StorageError};

    fn draft(id: &str, correct: usize) -> QuestionDraft {
        QuestionDraft {
            id: id.into(),
            theme: "capoeira".into(),
            prompt: format!("Question {id}"),
            options: vec!["Ginga".into(), "Au".into()],
            correct_option_index: correct,
            feedback: Feedback::default(),
        }
    }

    fn service(repo: &InMemoryRepository) -> InstructorService {
        InstructorService::new(Arc::new(repo.clone()), Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn invalid_draft_rejects_the_whole_set() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);

        let err = svc
            .upload_question_set(vec![draft("a", 0), draft("b", 5)])
            .await
            .unwrap_err();
        assert!(matches!(err, InstructorError::InvalidQuestion { index: 1, .. }));
        assert!(svc.list_questions().await.unwrap().is_empty());

        assert!(matches!(
            svc.upload_question_set(Vec::new()).await,
            Err(InstructorError::EmptyUpload)
        ));
    }

    #[tokio::test]
    async fn upload_then_delete() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);

        let stored = svc
            .upload_question_set(vec![draft("a", 0), draft("b", 1)])
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);

        let a = QuestionId::new("a").unwrap();
        svc.delete_question(&a).await.unwrap();
        assert_eq!(svc.list_questions().await.unwrap().len(), 1);
        assert!(matches!(
            svc.delete_question(&a).await,
            Err(InstructorError::Storage(StorageError::NotFound))
        ));
    }

    #[tokio::test]
    async fn list_questions_returns_uploaded_ids_in_order() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        svc.upload_question_set(vec![draft("b", 0), draft("a", 1)])
            .await
            .unwrap();

        let listed = svc.list_questions().await.unwrap();
        let ids: Vec<_> = listed.iter().map(|q| q.id().as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(listed[1].prompt(), "Question a");
    }

    #[tokio::test]
    async fn report_derives_rank_from_score() {
        let repo = InMemoryRepository::new();
        let mut ana = LearnerRecord::new(LearnerId::new(2), "Ana");
        ana.score = 6;
        repo.upsert_learner(&ana).await.unwrap();
        repo.upsert_learner(&LearnerRecord::new(LearnerId::new(1), "Bia"))
            .await
            .unwrap();

        let report = service(&repo).learner_report().await.unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].name, "Bia");
        assert_eq!(report[0].progress.current.label, "Aluno Novo (Iniciante)");
        assert_eq!(report[1].progress.current.label, "Cordão Laranja (Graduado)");
        assert_eq!(report[1].progress.points_to_next, 2);
    }
}
