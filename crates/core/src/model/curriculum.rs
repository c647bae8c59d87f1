use std::collections::{BTreeSet, HashSet};

use thiserror::Error;

use crate::model::ids::{ActivityTag, CourseTag, ModuleTag};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CurriculumError {
    #[error("module {module} appears more than once in course {course}")]
    DuplicateModule { course: CourseTag, module: ModuleTag },

    #[error("activity {activity} appears more than once in module {module}")]
    DuplicateActivity {
        module: ModuleTag,
        activity: ActivityTag,
    },
}

//
// ─── ACTIVITY ──────────────────────────────────────────────────────────────────
//

/// A leaf unit of the curriculum (a lesson page, an exercise, a video...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    tag: ActivityTag,
    title: String,
}

impl Activity {
    #[must_use]
    pub fn new(tag: ActivityTag, title: impl Into<String>) -> Self {
        Self {
            tag,
            title: title.into(),
        }
    }

    #[must_use]
    pub fn tag(&self) -> &ActivityTag {
        &self.tag
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// An ordered sequence of activities inside a course.
///
/// `scripted` gates navigation: a learner may open an activity only after
/// finishing the ones before it. `active` lets authors close a module
/// without removing it from the course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    tag: ModuleTag,
    title: String,
    scripted: bool,
    active: bool,
    activities: Vec<Activity>,
}

impl Module {
    /// Creates a module from its ordered activities.
    ///
    /// # Errors
    ///
    /// Returns `CurriculumError::DuplicateActivity` if two activities share a tag.
    pub fn new(
        tag: ModuleTag,
        title: impl Into<String>,
        scripted: bool,
        active: bool,
        activities: Vec<Activity>,
    ) -> Result<Self, CurriculumError> {
        let mut seen = HashSet::with_capacity(activities.len());
        for activity in &activities {
            if !seen.insert(activity.tag()) {
                return Err(CurriculumError::DuplicateActivity {
                    module: tag,
                    activity: activity.tag().clone(),
                });
            }
        }

        Ok(Self {
            tag,
            title: title.into(),
            scripted,
            active,
            activities,
        })
    }

    #[must_use]
    pub fn tag(&self) -> &ModuleTag {
        &self.tag
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn is_scripted(&self) -> bool {
        self.scripted
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    #[must_use]
    pub fn activity(&self, tag: &ActivityTag) -> Option<&Activity> {
        self.activities.iter().find(|a| a.tag() == tag)
    }

    #[must_use]
    pub fn has_activity(&self, tag: &ActivityTag) -> bool {
        self.activity(tag).is_some()
    }

    /// A module with nothing to do, or switched off by its author, cannot be opened.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.active && !self.activities.is_empty()
    }

    #[must_use]
    pub fn first_activity_tag(&self) -> Option<&ActivityTag> {
        self.activities.first().map(Activity::tag)
    }

    #[must_use]
    pub fn last_activity_tag(&self) -> Option<&ActivityTag> {
        self.activities.last().map(Activity::tag)
    }

    #[must_use]
    pub fn next_activity(&self, current: &ActivityTag) -> Option<&Activity> {
        let index = self.position(current)?;
        self.activities.get(index + 1)
    }

    #[must_use]
    pub fn previous_activity(&self, current: &ActivityTag) -> Option<&Activity> {
        let index = self.position(current)?;
        index.checked_sub(1).and_then(|i| self.activities.get(i))
    }

    /// Whether the learner may open `activity`, given the activities they already finished.
    ///
    /// Unscripted modules never lock an activity. Unknown activities are locked.
    #[must_use]
    pub fn is_activity_unlocked(
        &self,
        activity: &ActivityTag,
        finished: &BTreeSet<ActivityTag>,
    ) -> bool {
        let Some(index) = self.position(activity) else {
            return false;
        };
        !self.scripted
            || self.activities[..index]
                .iter()
                .all(|a| finished.contains(a.tag()))
    }

    fn position(&self, tag: &ActivityTag) -> Option<usize> {
        self.activities.iter().position(|a| a.tag() == tag)
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// Root of the curriculum hierarchy: an ordered sequence of modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    tag: CourseTag,
    title: String,
    scripted: bool,
    modules: Vec<Module>,
}

impl Course {
    /// Creates a course from its ordered modules.
    ///
    /// # Errors
    ///
    /// Returns `CurriculumError::DuplicateModule` if two modules share a tag.
    pub fn new(
        tag: CourseTag,
        title: impl Into<String>,
        scripted: bool,
        modules: Vec<Module>,
    ) -> Result<Self, CurriculumError> {
        let mut seen = HashSet::with_capacity(modules.len());
        for module in &modules {
            if !seen.insert(module.tag()) {
                return Err(CurriculumError::DuplicateModule {
                    course: tag,
                    module: module.tag().clone(),
                });
            }
        }

        Ok(Self {
            tag,
            title: title.into(),
            scripted,
            modules,
        })
    }

    #[must_use]
    pub fn tag(&self) -> &CourseTag {
        &self.tag
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn is_scripted(&self) -> bool {
        self.scripted
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn module(&self, tag: &ModuleTag) -> Option<&Module> {
        self.modules.iter().find(|m| m.tag() == tag)
    }

    #[must_use]
    pub fn has_module(&self, tag: &ModuleTag) -> bool {
        self.module(tag).is_some()
    }

    #[must_use]
    pub fn first_module_tag(&self) -> Option<&ModuleTag> {
        self.modules.first().map(Module::tag)
    }

    #[must_use]
    pub fn next_module(&self, current: &ModuleTag) -> Option<&Module> {
        let index = self.position(current)?;
        self.modules.get(index + 1)
    }

    #[must_use]
    pub fn previous_module(&self, current: &ModuleTag) -> Option<&Module> {
        let index = self.position(current)?;
        index.checked_sub(1).and_then(|i| self.modules.get(i))
    }

    /// Whether the learner may open `module`, given the modules they already finished.
    ///
    /// Unscripted courses never lock a module. Unknown modules are locked.
    #[must_use]
    pub fn is_module_unlocked(&self, module: &ModuleTag, finished: &BTreeSet<ModuleTag>) -> bool {
        let Some(index) = self.position(module) else {
            return false;
        };
        !self.scripted
            || self.modules[..index]
                .iter()
                .all(|m| finished.contains(m.tag()))
    }

    fn position(&self, tag: &ModuleTag) -> Option<usize> {
        self.modules.iter().position(|m| m.tag() == tag)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
