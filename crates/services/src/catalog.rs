//! Lookups the engine consumes but does not own: the curriculum and the learner directory.

use std::collections::HashMap;

use async_trait::async_trait;
use learn_core::model::{Course, CourseTag, LearnerId, LearnerProfile};
use storage::StorageError;

/// Resolves a course tag to its structural definition.
#[async_trait]
pub trait CurriculumCatalog: Send + Sync {
    /// Fetch a course with its ordered modules and activities.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog backend is unreachable.
    async fn course(&self, tag: &CourseTag) -> Result<Option<Course>, StorageError>;
}

/// Resolves a learner id to a directory profile.
#[async_trait]
pub trait LearnerDirectory: Send + Sync {
    /// Fetch a learner profile, or `None` when the account has no entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the directory backend is unreachable.
    async fn learner(&self, id: &LearnerId) -> Result<Option<LearnerProfile>, StorageError>;
}

/// Fixed, in-memory curriculum and learner directory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    courses: HashMap<CourseTag, Course>,
    learners: HashMap<LearnerId, LearnerProfile>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new(
        courses: impl IntoIterator<Item = Course>,
        learners: impl IntoIterator<Item = LearnerProfile>,
    ) -> Self {
        Self {
            courses: courses
                .into_iter()
                .map(|c| (c.tag().clone(), c))
                .collect(),
            learners: learners
                .into_iter()
                .map(|l| (l.id.clone(), l))
                .collect(),
        }
    }

    #[must_use]
    pub fn with_course(mut self, course: Course) -> Self {
        self.courses.insert(course.tag().clone(), course);
        self
    }

    #[must_use]
    pub fn with_learner(mut self, learner: LearnerProfile) -> Self {
        self.learners.insert(learner.id.clone(), learner);
        self
    }
}

#[async_trait]
impl CurriculumCatalog for StaticCatalog {
    async fn course(&self, tag: &CourseTag) -> Result<Option<Course>, StorageError> {
        Ok(self.courses.get(tag).cloned())
    }
}

#[async_trait]
impl LearnerDirectory for StaticCatalog {
    async fn learner(&self, id: &LearnerId) -> Result<Option<LearnerProfile>, StorageError> {
        Ok(self.learners.get(id).cloned())
    }
}
