//! Completion accounting: who finished which unit of a course.

mod aggregator;
mod collection;

use thiserror::Error;

use crate::model::{ActivityTag, CourseTag, ModuleTag};

pub use aggregator::{
    ActivityCompletion, CompletionAggregator, CompletionPartition, CourseCompletion,
    ModuleCompletion,
};
pub use collection::ProgressCollection;

/// Structural inconsistencies between the curriculum and the progress data.
///
/// These are contract violations: the request fails, nothing is tolerated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompletionError {
    #[error("progress for course {found} cannot be aggregated against course {expected}")]
    CourseMismatch { expected: CourseTag, found: CourseTag },

    #[error("module {module} is not part of course {course}")]
    UnknownModule { course: CourseTag, module: ModuleTag },

    #[error("activity {activity} is not part of module {module}")]
    UnknownActivity {
        module: ModuleTag,
        activity: ActivityTag,
    },
}
