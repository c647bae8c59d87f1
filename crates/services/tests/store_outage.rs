use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use learn_core::model::{
    Activity, ActivityTag, Course, CourseTag, LearnerId, Module, ModuleTag, TrackingConfig,
};
use learn_core::time::fixed_clock;
use services::{AppServices, CompletionServiceError, ProgressServiceError, StaticCatalog};
use storage::repository::{Triple, TripleQuery};
use storage::{ProgressStore, Storage, StorageError};

/// Store whose backend is unreachable; counts write attempts.
#[derive(Default)]
struct UnreachableStore {
    inserts: AtomicUsize,
}

#[async_trait]
impl ProgressStore for UnreachableStore {
    async fn query(&self, _query: &TripleQuery) -> Result<Vec<Triple>, StorageError> {
        Err(StorageError::Connection("down".into()))
    }

    async fn insert(&self, _s: &str, _p: &str, _v: &str) -> Result<(), StorageError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Connection("down".into()))
    }
}

fn course() -> Course {
    let module = Module::new(
        ModuleTag::new("M1").unwrap(),
        "M1",
        false,
        true,
        vec![Activity::new(ActivityTag::new("A1").unwrap(), "A1")],
    )
    .unwrap();
    Course::new(CourseTag::new("C").unwrap(), "C", false, vec![module]).unwrap()
}

fn app(store: Arc<UnreachableStore>) -> AppServices {
    let catalog = Arc::new(StaticCatalog::default().with_course(course()));
    AppServices::new(
        &Storage { progress: store },
        catalog.clone(),
        catalog,
        TrackingConfig::default(),
        fixed_clock(),
    )
}

#[tokio::test]
async fn dashboard_reports_outage_as_transient() {
    let app = app(Arc::new(UnreachableStore::default()));

    let err = app
        .completion()
        .compute_course_completion(&CourseTag::new("C").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, CompletionServiceError::Storage(_)));
    assert!(err.is_transient());

    let err = app
        .completion()
        .compute_module_completion(&CourseTag::new("C").unwrap(), &ModuleTag::new("M1").unwrap())
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn recording_during_outage_fails_without_writing() {
    let store = Arc::new(UnreachableStore::default());
    let app = app(store.clone());

    let err = app
        .progress()
        .record_activity_completion(
            &LearnerId::new("alice").unwrap(),
            &CourseTag::new("C").unwrap(),
            &ModuleTag::new("M1").unwrap(),
            &ActivityTag::new("A1").unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressServiceError::Storage(_)));
    assert!(err.is_transient());
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
}
