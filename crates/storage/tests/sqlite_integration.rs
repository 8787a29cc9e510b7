use quiz_core::model::{Feedback, LearnerId, QuestionDraft, QuestionId};
use storage::fallback::demo_questions;
use storage::repository::{LearnerRecord, LearnerRepository, QuestionRepository, StorageError};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn draft(id: &str, theme: &str) -> QuestionDraft {
    QuestionDraft {
        id: id.into(),
        theme: theme.into(),
        prompt: format!("Prompt {id}"),
        options: vec!["first".into(), "second".into(), "third".into()],
        correct_option_index: 2,
        feedback: Feedback::new("Yes", "Because.", Some("img/roda.png".into())),
    }
}

#[tokio::test]
async fn sqlite_roundtrips_questions_in_insertion_order() {
    let repo = connect("memdb_questions").await;

    for (id, theme) in [("h1", "history"), ("t1", "tech"), ("h2", "history")] {
        let question = draft(id, theme).validate().unwrap();
        repo.upsert_question(&question).await.unwrap();
    }

    let fetched = repo.fetch_questions().await.unwrap();
    let ids: Vec<_> = fetched.iter().map(|q| q.id().as_str()).collect();
    assert_eq!(ids, ["h1", "t1", "h2"]);
    assert_eq!(fetched[0].options(), ["first", "second", "third"]);
    assert_eq!(fetched[0].correct_option_index(), 2);
    assert_eq!(
        fetched[0].feedback().illustration_ref.as_deref(),
        Some("img/roda.png")
    );

    assert_eq!(repo.list_themes().await.unwrap(), ["history", "tech"]);
}

#[tokio::test]
async fn sqlite_upsert_updates_and_delete_removes() {
    let repo = connect("memdb_question_updates").await;
    for question in demo_questions().unwrap() {
        repo.upsert_question(&question).await.unwrap();
    }

    let mut changed = draft("mock1", "capoeira");
    changed.prompt = "Updated prompt".into();
    repo.upsert_question(&changed.validate().unwrap())
        .await
        .unwrap();

    let fetched = repo.fetch_questions().await.unwrap();
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched[0].prompt(), "Updated prompt");

    let id = QuestionId::new("mock2").unwrap();
    repo.delete_question(&id).await.unwrap();
    assert!(matches!(
        repo.delete_question(&id).await,
        Err(StorageError::NotFound)
    ));
    assert_eq!(repo.fetch_questions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_learner_scores_persist() {
    let repo = connect("memdb_learners").await;
    let ana = LearnerId::new(1);
    let bia = LearnerId::new(2);
    repo.upsert_learner(&LearnerRecord::new(bia, "Bia"))
        .await
        .unwrap();
    repo.upsert_learner(&LearnerRecord::new(ana, "Ana"))
        .await
        .unwrap();

    repo.record_attempt(ana, 9, "Cordão Azul (Instrutor)")
        .await
        .unwrap();

    assert_eq!(repo.initial_score(ana).await.unwrap(), 9);
    assert_eq!(repo.initial_score(bia).await.unwrap(), 0);
    assert!(matches!(
        repo.initial_score(LearnerId::new(3)).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.record_attempt(LearnerId::new(3), 1, "x").await,
        Err(StorageError::NotFound)
    ));

    let learners = repo.list_learners().await.unwrap();
    assert_eq!(learners.len(), 2);
    assert_eq!(learners[0].name, "Ana");
    assert_eq!(learners[0].rank.as_deref(), Some("Cordão Azul (Instrutor)"));
    assert_eq!(learners[1].rank, None);
}
