use std::sync::Arc;

use learn_core::completion::{
    CompletionAggregator, CourseCompletion, ModuleCompletion, ProgressCollection,
};
use learn_core::model::{Course, CourseTag, LearnerEntry, LearnerId, ModuleTag};
use storage::{ProgressFilter, ProgressRepository};
use tracing::{debug, info};

use crate::catalog::{CurriculumCatalog, LearnerDirectory};
use crate::error::CompletionServiceError;

/// Course-wide dashboard: per-module partitions plus display entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDashboard {
    pub completion: CourseCompletion,
    /// Every learner seen in the course, sorted by id.
    pub learners: Vec<LearnerEntry>,
}

impl CourseDashboard {
    #[must_use]
    pub fn learner(&self, id: &LearnerId) -> Option<&LearnerEntry> {
        find_entry(&self.learners, id)
    }
}

/// Dashboard for a single module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDashboard {
    pub course: CourseTag,
    pub completion: ModuleCompletion,
    pub learners: Vec<LearnerEntry>,
}

impl ModuleDashboard {
    #[must_use]
    pub fn learner(&self, id: &LearnerId) -> Option<&LearnerEntry> {
        find_entry(&self.learners, id)
    }
}

fn find_entry<'a>(entries: &'a [LearnerEntry], id: &LearnerId) -> Option<&'a LearnerEntry> {
    entries
        .binary_search_by(|entry| entry.id.cmp(id))
        .ok()
        .map(|idx| &entries[idx])
}

/// Reads a course's progress in bulk and partitions its learners.
#[derive(Clone)]
pub struct CompletionService {
    progress: ProgressRepository,
    curriculum: Arc<dyn CurriculumCatalog>,
    learners: Arc<dyn LearnerDirectory>,
}

impl CompletionService {
    #[must_use]
    pub fn new(
        progress: ProgressRepository,
        curriculum: Arc<dyn CurriculumCatalog>,
        learners: Arc<dyn LearnerDirectory>,
    ) -> Self {
        Self {
            progress,
            curriculum,
            learners,
        }
    }

    /// Finished and not-finished learners for every activity, every module
    /// and the course as a whole.
    ///
    /// # Errors
    ///
    /// Returns `CompletionServiceError::UnknownCourse` when the curriculum has
    /// no such course, and `Storage` when progress or lookups cannot be read.
    pub async fn compute_course_completion(
        &self,
        course_tag: &CourseTag,
    ) -> Result<CourseDashboard, CompletionServiceError> {
        let course = self.load_course(course_tag).await?;
        let progress = self.load_progress(course_tag).await?;
        let completion = CompletionAggregator::new(&course, &progress)?.course_completion();
        let learners = self.resolve_learners(&progress).await?;

        info!(
            course = %course_tag,
            learners = learners.len(),
            finished = completion.partition.finished.len(),
            "course completion computed"
        );
        Ok(CourseDashboard {
            completion,
            learners,
        })
    }

    /// Partitions for one module and its activities.
    ///
    /// # Errors
    ///
    /// Returns `CompletionServiceError::UnknownCourse`, `Completion` when the
    /// module is not part of the course, or `Storage`.
    pub async fn compute_module_completion(
        &self,
        course_tag: &CourseTag,
        module_tag: &ModuleTag,
    ) -> Result<ModuleDashboard, CompletionServiceError> {
        let course = self.load_course(course_tag).await?;
        let progress = self.load_progress(course_tag).await?;
        let completion =
            CompletionAggregator::new(&course, &progress)?.module_completion(module_tag)?;
        let learners = self.resolve_learners(&progress).await?;

        info!(
            course = %course_tag,
            module = %module_tag,
            finished = completion.partition.finished.len(),
            "module completion computed"
        );
        Ok(ModuleDashboard {
            course: course_tag.clone(),
            completion,
            learners,
        })
    }

    async fn load_course(&self, tag: &CourseTag) -> Result<Course, CompletionServiceError> {
        self.curriculum
            .course(tag)
            .await?
            .ok_or_else(|| CompletionServiceError::UnknownCourse(tag.clone()))
    }

    async fn load_progress(
        &self,
        course: &CourseTag,
    ) -> Result<ProgressCollection, CompletionServiceError> {
        let records = self
            .progress
            .find(&ProgressFilter::course(course.clone()))
            .await?;
        debug!(course = %course, records = records.len(), "course progress loaded");
        Ok(ProgressCollection::from_records(course.clone(), records)?)
    }

    async fn resolve_learners(
        &self,
        progress: &ProgressCollection,
    ) -> Result<Vec<LearnerEntry>, CompletionServiceError> {
        let mut entries = Vec::with_capacity(progress.all_learner_ids().len());
        for id in progress.all_learner_ids() {
            let profile = self.learners.learner(id).await?;
            entries.push(LearnerEntry::resolve(id.clone(), profile));
        }
        Ok(entries)
    }
}
