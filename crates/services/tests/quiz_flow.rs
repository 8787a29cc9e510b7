use std::sync::Arc;

use quiz_core::model::{Feedback, LearnerId, Question, QuestionDraft};
use quiz_core::time::fixed_now;
use services::{
    Advance, Clock, Phase, QuestionSelector, QuizLoopService, QuizServiceError, QuizSession,
    RemoteQuestionSource, RepositorySource, TickEvent,
};
use storage::repository::{InMemoryRepository, LearnerRecord, LearnerRepository, StorageError};

fn question(id: &str, theme: &str, correct: usize) -> Question {
    QuestionDraft {
        id: id.into(),
        theme: theme.into(),
        prompt: format!("Question {id}"),
        options: vec!["A".into(), "B".into(), "C".into()],
        correct_option_index: correct,
        feedback: Feedback::new("Nice", format!("Explanation {id}"), None),
    }
    .validate()
    .unwrap()
}

async fn repo_with_learner(score: u32) -> (InMemoryRepository, LearnerId) {
    let repo = InMemoryRepository::with_questions(vec![
        question("h1", "history", 0),
        question("h2", "history", 1),
        question("h3", "history", 2),
        question("t1", "tech", 0),
        question("t2", "tech", 1),
    ]);
    let id = LearnerId::new(1);
    let mut learner = LearnerRecord::new(id, "Ana");
    learner.score = score;
    repo.upsert_learner(&learner).await.unwrap();
    (repo, id)
}

fn loop_service(repo: &InMemoryRepository) -> QuizLoopService {
    QuizLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(RepositorySource::new(Arc::new(repo.clone()))),
        Arc::new(repo.clone()),
    )
    .with_seed(11)
}

fn answer_current(session: &mut QuizSession, right: bool) {
    let question = session.current_question().unwrap();
    let correct = question.correct_option_index();
    let pick = if right {
        correct
    } else {
        (correct + 1) % question.options().len()
    };
    session.choose(pick).unwrap();
    session.submit().unwrap();
}

#[tokio::test]
async fn history_attempt_persists_score_and_rank() {
    let (repo, learner) = repo_with_learner(4).await;
    let svc = loop_service(&repo);

    let mut session = svc.open_session(learner).await.unwrap();
    assert_eq!(session.score(), 4);

    assert!(session.start_attempt(Some("geography")).is_err());
    assert_eq!(session.phase(), Phase::Idle);

    session.start_attempt(Some("history")).unwrap();
    assert_eq!(session.total_questions(), 3);
    assert!(session.ordering().iter().all(|q| q.theme() == "history"));

    answer_current(&mut session, true);
    assert!(!svc.advance(learner, &mut session).await.unwrap().recorded);
    answer_current(&mut session, false);
    assert!(!svc.advance(learner, &mut session).await.unwrap().recorded);
    answer_current(&mut session, true);
    let step = svc.advance(learner, &mut session).await.unwrap();

    assert!(step.recorded);
    let Advance::Completed(summary) = step.advance else {
        panic!("expected completion");
    };
    assert_eq!(summary.final_score(), 6);
    assert_eq!(summary.rank().label, "Cordão Laranja (Graduado)");

    let stored = repo.get_learner(learner).await.unwrap().unwrap();
    assert_eq!(stored.score, 6);
    assert_eq!(stored.rank.as_deref(), Some("Cordão Laranja (Graduado)"));

    // A new session picks the stored score back up.
    let next = svc.open_session(learner).await.unwrap();
    assert_eq!(next.score(), 6);
}

#[tokio::test]
async fn abandoned_attempt_does_not_reach_the_stored_score() {
    let (repo, learner) = repo_with_learner(2).await;
    let svc = loop_service(&repo);
    let mut session = svc.open_session(learner).await.unwrap();

    session.start_attempt(Some("tech")).unwrap();
    answer_current(&mut session, true);
    assert_eq!(session.score(), 3);
    session.leave();
    assert_eq!(session.score(), 2);

    session.start_attempt(Some("tech")).unwrap();
    answer_current(&mut session, false);
    svc.advance(learner, &mut session).await.unwrap();
    answer_current(&mut session, false);
    let step = svc.advance(learner, &mut session).await.unwrap();
    assert!(step.recorded);

    let stored = repo.get_learner(learner).await.unwrap().unwrap();
    assert_eq!(stored.score, 2);
}

#[tokio::test]
async fn timed_out_question_counts_as_incorrect() {
    let (repo, learner) = repo_with_learner(0).await;
    let svc = loop_service(&repo);
    let mut session = svc.open_session(learner).await.unwrap();

    let token = session.start_attempt(Some("tech")).unwrap();
    let mut ticks = 0;
    let revealed = loop {
        ticks += 1;
        match session.tick(token) {
            TickEvent::Counting { .. } => {}
            TickEvent::Expired(revealed) => break revealed,
            TickEvent::Ignored => panic!("live token ignored"),
        }
    };
    assert_eq!(ticks, 21);
    assert!(!revealed.correct);
    assert!(revealed.text.starts_with("The correct answer was:"));
    assert_eq!(session.score(), 0);
}

#[tokio::test]
async fn unreachable_remote_bank_falls_back_to_demo_set() {
    let repo = InMemoryRepository::new();
    let learner = LearnerId::new(9);
    repo.upsert_learner(&LearnerRecord::new(learner, "Bia"))
        .await
        .unwrap();

    let svc = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(RemoteQuestionSource::new("http://127.0.0.1:9/questions")),
        Arc::new(repo.clone()),
    );

    let themes = svc.themes().await.unwrap();
    assert_eq!(themes, ["capoeira", "tecnologia"]);

    let mut session = svc.open_session(learner).await.unwrap();
    session.start_attempt(Some("capoeira")).unwrap();
    assert_eq!(session.current_question().unwrap().id().as_str(), "mock1");
}

#[tokio::test]
async fn empty_bank_is_reported_as_empty_selection() {
    let repo = InMemoryRepository::new();
    let learner = LearnerId::new(1);
    repo.upsert_learner(&LearnerRecord::new(learner, "Ana"))
        .await
        .unwrap();

    let mut session = loop_service(&repo).open_session(learner).await.unwrap();
    assert!(session.start_attempt(None).is_err());
    assert_eq!(session.phase(), Phase::Idle);
}

#[tokio::test]
async fn unknown_learner_cannot_open_a_session() {
    let repo = InMemoryRepository::new();
    let err = loop_service(&repo)
        .open_session(LearnerId::new(42))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizServiceError::Storage(StorageError::NotFound)));
}

#[test]
fn sessions_with_the_same_seed_see_the_same_order() {
    let bank: Vec<_> = (0..8).map(|i| question(&format!("q{i}"), "tech", 0)).collect();
    let order = |seed| {
        let mut session =
            QuizSession::new(bank.clone(), 0).with_selector(QuestionSelector::seeded(seed));
        session.start_attempt(None).unwrap();
        session
            .ordering()
            .iter()
            .map(|q| q.id().clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(order(5), order(5));
}
