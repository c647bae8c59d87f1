mod curriculum;
mod ids;
mod learner;
mod progress;

pub use curriculum::{Activity, Course, CurriculumError, Module};
pub use ids::{ActivityTag, CourseTag, LearnerId, ModuleTag, ParseIdError};
pub use learner::{LearnerEntry, LearnerProfile, LearnerRole, TrackingConfig};
pub use progress::{LOG_TIME_FORMAT, PayloadError, ProgressRecord, ProgressScope};
