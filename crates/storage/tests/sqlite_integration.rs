use std::sync::Arc;

use learn_core::model::{
    ActivityTag, CourseTag, LearnerId, ModuleTag, ProgressRecord, ProgressScope,
};
use learn_core::time::fixed_now;
use storage::repository::{ProgressStore, SubjectFilter, TripleQuery};
use storage::sqlite::SqliteRepository;
use storage::{PROGRESS_PREDICATE, ProgressFilter, ProgressRepository, StorageError};

fn record(learner: &str, module: &str, activity: Option<&str>) -> ProgressRecord {
    ProgressRecord::new(
        LearnerId::new(learner).unwrap(),
        CourseTag::new("Course").unwrap(),
        ModuleTag::new(module).unwrap(),
        ProgressScope::from_activity(activity.map(|a| ActivityTag::new(a).unwrap())),
        fixed_now(),
    )
}

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_discriminates_module_and_activity_records() {
    let sqlite = connect("memdb_progress_roundtrip").await;
    let repo = ProgressRepository::new(Arc::new(sqlite));

    repo.insert(&record("alice", "M1", Some("A1"))).await.unwrap();
    repo.insert(&record("alice", "M1", None)).await.unwrap();
    repo.insert(&record("bob", "M1", Some("A1"))).await.unwrap();

    let all = repo
        .find(&ProgressFilter::course(CourseTag::new("Course").unwrap()))
        .await
        .expect("course query");
    assert_eq!(all.len(), 3);
    assert_eq!(all[0], record("alice", "M1", Some("A1")));

    let module_level = repo
        .find(&ProgressFilter::unit(
            LearnerId::new("alice").unwrap(),
            CourseTag::new("Course").unwrap(),
            ModuleTag::new("M1").unwrap(),
            None,
        ))
        .await
        .expect("module query");
    assert_eq!(module_level, vec![record("alice", "M1", None)]);

    let bob_module = repo
        .find_one(&ProgressFilter::unit(
            LearnerId::new("bob").unwrap(),
            CourseTag::new("Course").unwrap(),
            ModuleTag::new("M1").unwrap(),
            None,
        ))
        .await
        .expect("bob module query");
    assert!(bob_module.is_none());
}

#[tokio::test]
async fn sqlite_like_is_case_sensitive_and_escaped() {
    let sqlite = connect("memdb_progress_like").await;

    sqlite
        .insert("alice", PROGRESS_PREDICATE, "prefix_value")
        .await
        .unwrap();
    sqlite
        .insert("alice", PROGRESS_PREDICATE, "PREFIXxvalue")
        .await
        .unwrap();

    let hits = sqlite
        .query(&TripleQuery::object_like(
            SubjectFilter::Exact("alice".into()),
            PROGRESS_PREDICATE,
            r"prefix\_%",
        ))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].value, "prefix_value");

    let none = sqlite
        .query(&TripleQuery::object_like(
            SubjectFilter::Exact("bob".into()),
            PROGRESS_PREDICATE,
            "%",
        ))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn sqlite_corrupt_rows_do_not_abort_queries() {
    let sqlite = connect("memdb_progress_corrupt").await;
    sqlite
        .insert("mallory", PROGRESS_PREDICATE, r#"{"course":"Course",oops"#)
        .await
        .unwrap();
    let repo = ProgressRepository::new(Arc::new(sqlite));
    repo.insert(&record("carol", "M2", Some("A9"))).await.unwrap();

    let all = repo
        .find(&ProgressFilter::course(CourseTag::new("Course").unwrap()))
        .await
        .unwrap();
    assert_eq!(all, vec![record("carol", "M2", Some("A9"))]);
}

#[tokio::test]
async fn sqlite_schema_errors_are_not_retryable() {
    let unmigrated =
        SqliteRepository::connect("sqlite:file:memdb_progress_unmigrated?mode=memory&cache=shared")
            .await
            .expect("connect");

    let err = unmigrated
        .insert("alice", PROGRESS_PREDICATE, "{}")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Query(_)));
    assert!(!err.is_transient());

    let err = unmigrated
        .query(&TripleQuery::object_like(SubjectFilter::Any, PROGRESS_PREDICATE, "%"))
        .await
        .unwrap_err();
    assert!(!err.is_transient());
}
