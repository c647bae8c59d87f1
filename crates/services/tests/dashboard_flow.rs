use std::sync::Arc;

use learn_core::model::{
    Activity, ActivityTag, Course, CourseTag, LearnerId, Module, ModuleTag, TrackingConfig,
};
use learn_core::time::fixed_now;
use services::{AppServices, Clock, StaticCatalog};
use storage::Storage;

fn tag<T: std::str::FromStr>(raw: &str) -> T
where
    T::Err: std::fmt::Debug,
{
    raw.parse().unwrap()
}

fn course() -> Course {
    let module = |name: &str, activities: &[&str]| {
        Module::new(
            tag(name),
            name,
            true,
            true,
            activities
                .iter()
                .map(|a| Activity::new(tag(a), *a))
                .collect(),
        )
        .unwrap()
    };
    Course::new(
        tag("C"),
        "Course",
        true,
        vec![module("M1", &["A1", "A2"]), module("M2", &["B1"])],
    )
    .unwrap()
}

fn app() -> AppServices {
    let catalog = Arc::new(StaticCatalog::default().with_course(course()));
    AppServices::new(
        &Storage::in_memory(),
        catalog.clone(),
        catalog,
        TrackingConfig::default(),
        Clock::fixed(fixed_now()),
    )
}

async fn complete(app: &AppServices, learner: &str, module: &str, activity: &str) {
    let recorded = app
        .progress()
        .record_activity_completion(
            &tag::<LearnerId>(learner),
            &tag::<CourseTag>("C"),
            &tag::<ModuleTag>(module),
            &tag::<ActivityTag>(activity),
        )
        .await
        .unwrap();
    assert!(recorded);
}

#[tokio::test]
async fn module_finished_but_course_not() {
    let app = app();
    complete(&app, "alice", "M1", "A1").await;
    complete(&app, "alice", "M1", "A2").await;

    let module = app
        .completion()
        .compute_module_completion(&tag("C"), &tag("M1"))
        .await
        .unwrap();
    assert_eq!(module.completion.partition.finished, vec![tag::<LearnerId>("alice")]);

    let course = app
        .completion()
        .compute_course_completion(&tag("C"))
        .await
        .unwrap();
    assert!(course.completion.partition.finished.is_empty());
    assert_eq!(
        course.completion.partition.not_finished,
        vec![tag::<LearnerId>("alice")]
    );
    assert!(course.learner(&tag("alice")).unwrap().placeholder);
}

#[tokio::test]
async fn learner_with_every_activity_finishes_the_course() {
    let app = app();
    complete(&app, "alice", "M1", "A1").await;
    complete(&app, "alice", "M1", "A2").await;
    for (module, activity) in [("M2", "B1"), ("M1", "A2"), ("M1", "A1")] {
        complete(&app, "bob", module, activity).await;
    }

    let course = app
        .completion()
        .compute_course_completion(&tag("C"))
        .await
        .unwrap();
    assert_eq!(course.completion.partition.finished, vec![tag::<LearnerId>("bob")]);
    assert_eq!(
        course.completion.partition.not_finished,
        vec![tag::<LearnerId>("alice")]
    );

    let m2 = &course.completion.modules[1];
    assert_eq!(m2.module, tag::<ModuleTag>("M2"));
    assert_eq!(m2.partition.finished, vec![tag::<LearnerId>("bob")]);
}
