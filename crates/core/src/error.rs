use thiserror::Error;

use crate::completion::CompletionError;
use crate::model::{CurriculumError, ParseIdError, PayloadError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidId(#[from] ParseIdError),
    #[error(transparent)]
    Curriculum(#[from] CurriculumError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}
