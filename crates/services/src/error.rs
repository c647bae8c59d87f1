//! Shared error types for the services crate.

use thiserror::Error;

use learn_core::completion::CompletionError;
use learn_core::model::CourseTag;
use storage::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `LearnerProgressService`.
///
/// Policy rejections are not errors; they come back as `Ok(false)`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl ProgressServiceError {
    /// Whether retrying the same call later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ProgressServiceError::Storage(e) => e.is_transient(),
            ProgressServiceError::Completion(_) => false,
        }
    }
}

/// Errors emitted by `CompletionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompletionServiceError {
    #[error("course {0} is not in the curriculum")]
    UnknownCourse(CourseTag),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CompletionServiceError {
    /// Whether retrying the same call later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            CompletionServiceError::Storage(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
