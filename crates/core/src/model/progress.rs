use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ActivityTag, CourseTag, LearnerId, ModuleTag};

/// Timestamp layout of the `log_time` payload key.
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised while decoding a stored progress payload.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PayloadError {
    #[error("malformed progress payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid log_time: {0}")]
    LogTime(String),
}

//
// ─── SCOPE ─────────────────────────────────────────────────────────────────────
//

/// What a progress record marks as finished inside its module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProgressScope {
    /// The module itself, with no specific activity.
    Module,
    /// One activity of the module.
    Activity(ActivityTag),
}

impl ProgressScope {
    #[must_use]
    pub fn activity(&self) -> Option<&ActivityTag> {
        match self {
            ProgressScope::Module => None,
            ProgressScope::Activity(tag) => Some(tag),
        }
    }

    #[must_use]
    pub fn from_activity(activity: Option<ActivityTag>) -> Self {
        activity.map_or(ProgressScope::Module, ProgressScope::Activity)
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// One immutable completion event for one learner.
///
/// At most one record is meant to exist per
/// `(learner_id, course, module, scope)`; readers still treat duplicates as a
/// single completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub learner_id: LearnerId,
    pub course: CourseTag,
    pub module: ModuleTag,
    pub scope: ProgressScope,
    pub completed_at: DateTime<Utc>,
}

/// Stored payload shape. Field order is part of the format: pattern queries
/// rely on `activity` sitting between `module` and `log_time`.
#[derive(Serialize, Deserialize)]
struct PayloadWire {
    course: CourseTag,
    module: ModuleTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    activity: Option<ActivityTag>,
    log_time: String,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(
        learner_id: LearnerId,
        course: CourseTag,
        module: ModuleTag,
        scope: ProgressScope,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            learner_id,
            course,
            module,
            scope,
            completed_at,
        }
    }

    #[must_use]
    pub fn activity(&self) -> Option<&ActivityTag> {
        self.scope.activity()
    }

    /// Whether this record marks a whole module rather than one activity.
    #[must_use]
    pub fn is_module_level(&self) -> bool {
        matches!(self.scope, ProgressScope::Module)
    }

    /// Encodes the record as the stored payload string.
    ///
    /// The learner is not part of the payload; it is the store's subject.
    #[must_use]
    pub fn encode_payload(&self) -> String {
        let wire = PayloadWire {
            course: self.course.clone(),
            module: self.module.clone(),
            activity: self.scope.activity().cloned(),
            log_time: self.completed_at.format(LOG_TIME_FORMAT).to_string(),
        };
        // Only strings are serialized here, so this cannot fail.
        serde_json::to_string(&wire).unwrap_or_default()
    }

    /// Decodes a stored payload for the given learner.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError` when the payload is not valid JSON, misses a key,
    /// carries a blank tag, or has an unreadable `log_time`.
    pub fn decode_payload(learner_id: LearnerId, payload: &str) -> Result<Self, PayloadError> {
        let wire: PayloadWire = serde_json::from_str(payload)?;
        let completed_at = parse_log_time(&wire.log_time)?;
        Ok(Self {
            learner_id,
            course: wire.course,
            module: wire.module,
            scope: ProgressScope::from_activity(wire.activity),
            completed_at,
        })
    }
}

fn parse_log_time(raw: &str) -> Result<DateTime<Utc>, PayloadError> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, LOG_TIME_FORMAT) {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| PayloadError::LogTime(raw.to_owned()))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
