use std::sync::Arc;

use learn_core::completion::{CompletionAggregator, ProgressCollection};
use learn_core::model::{
    ActivityTag, CourseTag, LearnerId, LearnerRole, ModuleTag, ProgressRecord, ProgressScope,
    TrackingConfig,
};
use learn_core::navigation::{LearnerCompletion, Navigation, Stop};
use storage::{ProgressFilter, ProgressRepository};
use tracing::{debug, info};

use crate::Clock;
use crate::catalog::{CurriculumCatalog, LearnerDirectory};
use crate::error::ProgressServiceError;

/// Records learner completions, one record per learner and unit.
///
/// Two concurrent calls for the same unit may both pass the existence check
/// and write twice; readers count such duplicates once.
#[derive(Clone)]
pub struct LearnerProgressService {
    clock: Clock,
    config: TrackingConfig,
    progress: ProgressRepository,
    curriculum: Arc<dyn CurriculumCatalog>,
    learners: Arc<dyn LearnerDirectory>,
}

impl LearnerProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        config: TrackingConfig,
        progress: ProgressRepository,
        curriculum: Arc<dyn CurriculumCatalog>,
        learners: Arc<dyn LearnerDirectory>,
    ) -> Self {
        Self {
            clock,
            config,
            progress,
            curriculum,
            learners,
        }
    }

    /// Mark `activity` finished for `learner`.
    ///
    /// Returns `Ok(false)` without writing when the activity is not part of
    /// the module (or the module not part of the course), when the learner's
    /// role is excluded from tracking, or when the completion already exists.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a lookup or the store fails.
    pub async fn record_activity_completion(
        &self,
        learner: &LearnerId,
        course: &CourseTag,
        module: &ModuleTag,
        activity: &ActivityTag,
    ) -> Result<bool, ProgressServiceError> {
        self.record(learner, course, module, Some(activity)).await
    }

    /// Mark a whole module finished for `learner`, with no specific activity.
    ///
    /// Same rejection rules as [`Self::record_activity_completion`].
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a lookup or the store fails.
    pub async fn record_module_completion(
        &self,
        learner: &LearnerId,
        course: &CourseTag,
        module: &ModuleTag,
    ) -> Result<bool, ProgressServiceError> {
        self.record(learner, course, module, None).await
    }

    /// The learner's record for one exact unit, if any.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the store cannot be queried.
    pub async fn learner_unit_progress(
        &self,
        learner: &LearnerId,
        course: &CourseTag,
        module: &ModuleTag,
        activity: Option<&ActivityTag>,
    ) -> Result<Option<ProgressRecord>, ProgressServiceError> {
        let filter = ProgressFilter::unit(
            learner.clone(),
            course.clone(),
            module.clone(),
            activity.cloned(),
        );
        Ok(self.progress.find_one(&filter).await?)
    }

    /// Previous and next stops around `current`, locked according to what
    /// `learner` finished. `None` when the course is unknown.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Completion` when `current` is not part
    /// of the course, and `Storage` if the store cannot be queried.
    pub async fn navigation(
        &self,
        learner: &LearnerId,
        course_tag: &CourseTag,
        current: &Stop,
    ) -> Result<Option<Navigation>, ProgressServiceError> {
        let Some(course) = self.curriculum.course(course_tag).await? else {
            return Ok(None);
        };
        let records = self
            .progress
            .find(&ProgressFilter::learner_course(learner.clone(), course_tag.clone()))
            .await?;
        let progress = ProgressCollection::from_records(course_tag.clone(), records)?;
        let completion = CompletionAggregator::new(&course, &progress)?.course_completion();
        let finished = LearnerCompletion::of(learner, &completion);
        Ok(Some(Navigation::plan(&course, current, &finished)?))
    }

    async fn record(
        &self,
        learner: &LearnerId,
        course_tag: &CourseTag,
        module_tag: &ModuleTag,
        activity: Option<&ActivityTag>,
    ) -> Result<bool, ProgressServiceError> {
        let Some(course) = self.curriculum.course(course_tag).await? else {
            debug!(%learner, course = %course_tag, "unknown course, progress not recorded");
            return Ok(false);
        };
        let Some(module) = course.module(module_tag) else {
            debug!(%learner, course = %course_tag, module = %module_tag, "module not in course");
            return Ok(false);
        };
        if let Some(activity) = activity {
            if !module.has_activity(activity) {
                debug!(%learner, module = %module_tag, %activity, "activity not in module");
                return Ok(false);
            }
        }

        // Accounts missing from the directory are tracked as plain learners.
        let role = self
            .learners
            .learner(learner)
            .await?
            .map_or(LearnerRole::Learner, |profile| profile.role);
        if !self.config.tracks(role) {
            debug!(%learner, "role excluded from progress tracking");
            return Ok(false);
        }

        if self
            .learner_unit_progress(learner, course_tag, module_tag, activity)
            .await?
            .is_some()
        {
            debug!(
                %learner,
                course = %course_tag,
                module = %module_tag,
                "progress already recorded"
            );
            return Ok(false);
        }

        let record = ProgressRecord::new(
            learner.clone(),
            course_tag.clone(),
            module_tag.clone(),
            ProgressScope::from_activity(activity.cloned()),
            self.clock.now(),
        );
        self.progress.insert(&record).await?;
        info!(
            %learner,
            course = %course_tag,
            module = %module_tag,
            activity = activity.map(ActivityTag::as_str),
            "progress recorded"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use learn_core::model::{Activity, Course, LearnerProfile, Module};
    use learn_core::time::{fixed_clock, fixed_now};
    use storage::InMemoryProgressStore;

    use crate::catalog::StaticCatalog;

    fn course() -> Course {
        let activities = ["A1", "A2"]
            .into_iter()
            .map(|a| Activity::new(ActivityTag::new(a).unwrap(), a))
            .collect();
        Course::new(
            CourseTag::new("C").unwrap(),
            "Course",
            true,
            vec![
                Module::new(ModuleTag::new("M1").unwrap(), "M1", true, true, activities).unwrap(),
                Module::new(ModuleTag::new("M2").unwrap(), "M2", false, true, vec![]).unwrap(),
            ],
        )
        .unwrap()
    }

    fn service(store: &InMemoryProgressStore, config: TrackingConfig) -> LearnerProgressService {
        let catalog = Arc::new(
            StaticCatalog::default()
                .with_course(course())
                .with_learner(LearnerProfile::new(
                    LearnerId::new("root").unwrap(),
                    "Root",
                    LearnerRole::Admin,
                )),
        );
        LearnerProgressService::new(
            fixed_clock(),
            config,
            ProgressRepository::new(Arc::new(store.clone())),
            catalog.clone(),
            catalog,
        )
    }

    fn ids() -> (LearnerId, CourseTag, ModuleTag, ActivityTag) {
        (
            LearnerId::new("alice").unwrap(),
            CourseTag::new("C").unwrap(),
            ModuleTag::new("M1").unwrap(),
            ActivityTag::new("A1").unwrap(),
        )
    }

    #[tokio::test]
    async fn second_completion_is_a_no_op() {
        let store = InMemoryProgressStore::new();
        let svc = service(&store, TrackingConfig::default());
        let (learner, course, module, activity) = ids();

        assert!(
            svc.record_activity_completion(&learner, &course, &module, &activity)
                .await
                .unwrap()
        );
        assert!(
            !svc.record_activity_completion(&learner, &course, &module, &activity)
                .await
                .unwrap()
        );
        assert_eq!(store.len().unwrap(), 1);

        let stored = svc
            .learner_unit_progress(&learner, &course, &module, Some(&activity))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.completed_at, fixed_now());
    }

    #[tokio::test]
    async fn activity_outside_module_is_rejected() {
        let store = InMemoryProgressStore::new();
        let svc = service(&store, TrackingConfig::default());
        let (learner, course, _, activity) = ids();

        let recorded = svc
            .record_activity_completion(
                &learner,
                &course,
                &ModuleTag::new("M2").unwrap(),
                &activity,
            )
            .await
            .unwrap();
        assert!(!recorded);
        assert_eq!(store.len().unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_course_or_module_is_rejected() {
        let store = InMemoryProgressStore::new();
        let svc = service(&store, TrackingConfig::default());
        let (learner, course, module, _) = ids();

        assert!(
            !svc.record_module_completion(&learner, &CourseTag::new("X").unwrap(), &module)
                .await
                .unwrap()
        );
        assert!(
            !svc.record_module_completion(&learner, &course, &ModuleTag::new("M9").unwrap())
                .await
                .unwrap()
        );
        assert_eq!(store.len().unwrap(), 0);
    }

    #[tokio::test]
    async fn module_and_activity_completions_are_distinct() {
        let store = InMemoryProgressStore::new();
        let svc = service(&store, TrackingConfig::default());
        let (learner, course, module, activity) = ids();

        assert!(
            svc.record_activity_completion(&learner, &course, &module, &activity)
                .await
                .unwrap()
        );
        assert!(svc.record_module_completion(&learner, &course, &module).await.unwrap());
        assert!(!svc.record_module_completion(&learner, &course, &module).await.unwrap());

        let module_level = svc
            .learner_unit_progress(&learner, &course, &module, None)
            .await
            .unwrap()
            .unwrap();
        assert!(module_level.is_module_level());
        assert_eq!(store.len().unwrap(), 2);
    }

    #[tokio::test]
    async fn admins_are_skipped_unless_enabled() {
        let (_, course, module, activity) = ids();
        let admin = LearnerId::new("root").unwrap();

        let store = InMemoryProgressStore::new();
        let svc = service(&store, TrackingConfig::default());
        assert!(
            !svc.record_activity_completion(&admin, &course, &module, &activity)
                .await
                .unwrap()
        );
        assert_eq!(store.len().unwrap(), 0);

        let svc = service(
            &store,
            TrackingConfig {
                save_progress_for_admins: true,
            },
        );
        assert!(
            svc.record_activity_completion(&admin, &course, &module, &activity)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn navigation_unlocks_as_activities_are_finished() {
        let store = InMemoryProgressStore::new();
        let svc = service(&store, TrackingConfig::default());
        let (learner, course, module, activity) = ids();
        let here = Stop::Activity(module.clone(), activity.clone());

        let nav = svc.navigation(&learner, &course, &here).await.unwrap().unwrap();
        let next = nav.next.unwrap();
        assert_eq!(
            next.stop,
            Stop::Activity(module.clone(), ActivityTag::new("A2").unwrap())
        );
        assert!(!next.unlocked);

        svc.record_activity_completion(&learner, &course, &module, &activity)
            .await
            .unwrap();
        let nav = svc.navigation(&learner, &course, &here).await.unwrap().unwrap();
        assert!(nav.next.unwrap().unlocked);

        // alice's progress does not unlock anything for bob
        let other = svc
            .navigation(&LearnerId::new("bob").unwrap(), &course, &here)
            .await
            .unwrap()
            .unwrap();
        assert!(!other.next.unwrap().unlocked);
    }

    #[tokio::test]
    async fn navigation_rejects_unknown_stops() {
        let store = InMemoryProgressStore::new();
        let svc = service(&store, TrackingConfig::default());
        let (learner, course, _, _) = ids();

        let unknown_course = svc
            .navigation(&learner, &CourseTag::new("X").unwrap(), &Stop::Course)
            .await
            .unwrap();
        assert!(unknown_course.is_none());

        let err = svc
            .navigation(&learner, &course, &Stop::Module(ModuleTag::new("M9").unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressServiceError::Completion(_)));
        assert!(!err.is_transient());
    }
}
