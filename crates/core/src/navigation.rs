//! Previous / next moves through a course, and whether a learner may take them.

use std::collections::{BTreeMap, BTreeSet};

use crate::completion::{CompletionError, CourseCompletion};
use crate::model::{ActivityTag, Course, LearnerId, Module, ModuleTag};

/// A place a learner can stand in a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stop {
    /// The course entry page.
    Course,
    /// A module entry page.
    Module(ModuleTag),
    Activity(ModuleTag, ActivityTag),
}

/// What one learner has finished in a course.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnerCompletion {
    modules: BTreeSet<ModuleTag>,
    activities: BTreeMap<ModuleTag, BTreeSet<ActivityTag>>,
}

impl LearnerCompletion {
    /// Extracts `learner`'s finished modules and activities from a course computation.
    #[must_use]
    pub fn of(learner: &LearnerId, completion: &CourseCompletion) -> Self {
        let mut finished = Self::default();
        for module in &completion.modules {
            if module.partition.is_finished_by(learner) {
                finished.modules.insert(module.module.clone());
            }
            let activities: BTreeSet<_> = module
                .activities
                .iter()
                .filter(|a| a.partition.is_finished_by(learner))
                .map(|a| a.activity.clone())
                .collect();
            if !activities.is_empty() {
                finished.activities.insert(module.module.clone(), activities);
            }
        }
        finished
    }

    #[must_use]
    pub fn modules(&self) -> &BTreeSet<ModuleTag> {
        &self.modules
    }

    #[must_use]
    pub fn activities(&self, module: &ModuleTag) -> Option<&BTreeSet<ActivityTag>> {
        self.activities.get(module)
    }
}

/// A neighbouring stop, locked when the learner may not open it yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waypoint {
    pub stop: Stop,
    pub unlocked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub previous: Option<Waypoint>,
    pub next: Option<Waypoint>,
}

impl Navigation {
    /// Neighbours of `current`.
    ///
    /// The first activity of a module leads back to the module entry, and the
    /// last one leads on to the next module. The last activity of the last
    /// module has no next stop.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::UnknownModule` or `UnknownActivity` when
    /// `current` is not part of `course`.
    pub fn plan(
        course: &Course,
        current: &Stop,
        finished: &LearnerCompletion,
    ) -> Result<Self, CompletionError> {
        let (previous, next) = match current {
            Stop::Course => (None, course.first_module_tag().cloned().map(Stop::Module)),
            Stop::Module(tag) => {
                let module = known_module(course, tag)?;
                let previous = course
                    .previous_module(tag)
                    .map_or(Stop::Course, |m| Stop::Module(m.tag().clone()));
                let next = match module.first_activity_tag() {
                    Some(first) => Some(Stop::Activity(tag.clone(), first.clone())),
                    None => course.next_module(tag).map(|m| Stop::Module(m.tag().clone())),
                };
                (Some(previous), next)
            }
            Stop::Activity(tag, activity) => {
                let module = known_module(course, tag)?;
                if !module.has_activity(activity) {
                    return Err(CompletionError::UnknownActivity {
                        module: tag.clone(),
                        activity: activity.clone(),
                    });
                }
                let previous = module
                    .previous_activity(activity)
                    .map_or(Stop::Module(tag.clone()), |a| {
                        Stop::Activity(tag.clone(), a.tag().clone())
                    });
                let next = if module.last_activity_tag() == Some(activity) {
                    course.next_module(tag).map(|m| Stop::Module(m.tag().clone()))
                } else {
                    module
                        .next_activity(activity)
                        .map(|a| Stop::Activity(tag.clone(), a.tag().clone()))
                };
                (Some(previous), next)
            }
        };

        let waypoint = |stop: Stop| Waypoint {
            unlocked: is_open(course, &stop, finished),
            stop,
        };
        Ok(Self {
            previous: previous.map(waypoint),
            next: next.map(waypoint),
        })
    }
}

fn known_module<'a>(course: &'a Course, tag: &ModuleTag) -> Result<&'a Module, CompletionError> {
    course.module(tag).ok_or_else(|| CompletionError::UnknownModule {
        course: course.tag().clone(),
        module: tag.clone(),
    })
}

fn is_open(course: &Course, stop: &Stop, finished: &LearnerCompletion) -> bool {
    let (tag, activity) = match stop {
        Stop::Course => return true,
        Stop::Module(tag) => (tag, None),
        Stop::Activity(tag, activity) => (tag, Some(activity)),
    };
    let Some(module) = course.module(tag) else {
        return false;
    };
    if !module.is_accessible() || !course.is_module_unlocked(tag, finished.modules()) {
        return false;
    }
    activity.is_none_or(|activity| {
        let none = BTreeSet::new();
        let done = finished.activities(tag).unwrap_or(&none);
        module.is_activity_unlocked(activity, done)
    })
}
