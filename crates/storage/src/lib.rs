#![forbid(unsafe_code)]

pub mod progress;
pub mod repository;
pub mod sqlite;

pub use progress::{PROGRESS_PREDICATE, ProgressFilter, ProgressRepository, UnitFilter};
pub use repository::{InMemoryProgressStore, ProgressStore, Storage, StorageError};
