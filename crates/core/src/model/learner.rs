use crate::model::ids::LearnerId;

/// Role of a learner account, as far as progress tracking cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LearnerRole {
    #[default]
    Learner,
    Admin,
}

/// Directory entry for a learner account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerProfile {
    pub id: LearnerId,
    pub display_name: String,
    pub role: LearnerRole,
}

impl LearnerProfile {
    #[must_use]
    pub fn new(id: LearnerId, display_name: impl Into<String>, role: LearnerRole) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == LearnerRole::Admin
    }
}

/// How a learner is shown on a dashboard.
///
/// When the directory has no profile for an id, the entry is a placeholder
/// that uses the id itself as display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerEntry {
    pub id: LearnerId,
    pub display_name: String,
    pub placeholder: bool,
}

impl LearnerEntry {
    #[must_use]
    pub fn from_profile(profile: LearnerProfile) -> Self {
        Self {
            id: profile.id,
            display_name: profile.display_name,
            placeholder: false,
        }
    }

    #[must_use]
    pub fn placeholder(id: LearnerId) -> Self {
        Self {
            display_name: id.as_str().to_owned(),
            id,
            placeholder: true,
        }
    }

    /// Resolves an entry from an optional directory lookup result.
    #[must_use]
    pub fn resolve(id: LearnerId, profile: Option<LearnerProfile>) -> Self {
        match profile {
            Some(profile) => Self::from_profile(profile),
            None => Self::placeholder(id),
        }
    }
}

/// Tracking policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackingConfig {
    /// Record progress for administrators too. Off by default so that
    /// staff walking through a course do not show up on dashboards.
    pub save_progress_for_admins: bool,
}

impl TrackingConfig {
    /// Whether progress of a learner with `role` should be recorded.
    #[must_use]
    pub fn tracks(&self, role: LearnerRole) -> bool {
        role != LearnerRole::Admin || self.save_progress_for_admins
    }
}
