use std::sync::Arc;

use learn_core::model::TrackingConfig;
use storage::{ProgressRepository, Storage};

use crate::Clock;
use crate::catalog::{CurriculumCatalog, LearnerDirectory};
use crate::completion_service::CompletionService;
use crate::error::AppServicesError;
use crate::progress_service::LearnerProgressService;

/// Assembles the progress and completion services over one store.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<LearnerProgressService>,
    completion: Arc<CompletionService>,
}

impl AppServices {
    #[must_use]
    pub fn new(
        storage: &Storage,
        curriculum: Arc<dyn CurriculumCatalog>,
        learners: Arc<dyn LearnerDirectory>,
        config: TrackingConfig,
        clock: Clock,
    ) -> Self {
        let repository = ProgressRepository::new(Arc::clone(&storage.progress));
        let progress = Arc::new(LearnerProgressService::new(
            clock,
            config,
            repository.clone(),
            Arc::clone(&curriculum),
            Arc::clone(&learners),
        ));
        let completion = Arc::new(CompletionService::new(repository, curriculum, learners));
        Self {
            progress,
            completion,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        curriculum: Arc<dyn CurriculumCatalog>,
        learners: Arc<dyn LearnerDirectory>,
        config: TrackingConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, curriculum, learners, config, clock))
    }

    #[must_use]
    pub fn progress(&self) -> Arc<LearnerProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn completion(&self) -> Arc<CompletionService> {
        Arc::clone(&self.completion)
    }
}
