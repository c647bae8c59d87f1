#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod completion_service;
pub mod error;
pub mod progress_service;

pub use learn_core::Clock;

pub use app_services::AppServices;
pub use catalog::{CurriculumCatalog, LearnerDirectory, StaticCatalog};
pub use completion_service::{CompletionService, CourseDashboard, ModuleDashboard};
pub use error::{AppServicesError, CompletionServiceError, ProgressServiceError};
pub use progress_service::LearnerProgressService;
