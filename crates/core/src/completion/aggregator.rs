use std::collections::BTreeSet;

use crate::completion::{CompletionError, ProgressCollection};
use crate::model::{ActivityTag, Course, CourseTag, LearnerId, Module, ModuleTag};

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// Finished / not-finished split of every learner present in a course.
///
/// Both sides are sorted by learner id ascending.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletionPartition {
    pub finished: Vec<LearnerId>,
    pub not_finished: Vec<LearnerId>,
}

impl CompletionPartition {
    fn split(finished: &BTreeSet<LearnerId>, universe: &BTreeSet<LearnerId>) -> Self {
        Self {
            finished: finished.iter().cloned().collect(),
            not_finished: universe.difference(finished).cloned().collect(),
        }
    }

    #[must_use]
    pub fn is_finished_by(&self, learner: &LearnerId) -> bool {
        self.finished.binary_search(learner).is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCompletion {
    pub activity: ActivityTag,
    pub partition: CompletionPartition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCompletion {
    pub module: ModuleTag,
    /// One entry per activity, in curriculum order.
    pub activities: Vec<ActivityCompletion>,
    pub partition: CompletionPartition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseCompletion {
    pub course: CourseTag,
    /// One entry per module, in curriculum order.
    pub modules: Vec<ModuleCompletion>,
    pub partition: CompletionPartition,
}

//
// ─── AGGREGATOR ────────────────────────────────────────────────────────────────
//

/// Derives finished learner sets for every level of a course.
///
/// A module is finished when every one of its activities is, and a course
/// when every one of its modules is. Completion order and the `scripted`
/// flag play no part. A unit with no children has nobody finished.
///
/// Pure: no I/O, no mutation of its inputs.
#[derive(Debug, Clone, Copy)]
pub struct CompletionAggregator<'a> {
    course: &'a Course,
    progress: &'a ProgressCollection,
}

impl<'a> CompletionAggregator<'a> {
    /// # Errors
    ///
    /// Returns `CompletionError::CourseMismatch` if `progress` was built for another course.
    pub fn new(
        course: &'a Course,
        progress: &'a ProgressCollection,
    ) -> Result<Self, CompletionError> {
        if progress.course() != course.tag() {
            return Err(CompletionError::CourseMismatch {
                expected: course.tag().clone(),
                found: progress.course().clone(),
            });
        }
        Ok(Self { course, progress })
    }

    /// Partition for one activity of one module.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::UnknownModule` or `CompletionError::UnknownActivity`
    /// when the unit is not part of the course.
    pub fn activity_completion(
        &self,
        module: &ModuleTag,
        activity: &ActivityTag,
    ) -> Result<CompletionPartition, CompletionError> {
        let module = self.module(module)?;
        if !module.has_activity(activity) {
            return Err(CompletionError::UnknownActivity {
                module: module.tag().clone(),
                activity: activity.clone(),
            });
        }
        Ok(CompletionPartition::split(
            self.progress.finished_learner_ids(module.tag(), Some(activity)),
            self.progress.all_learner_ids(),
        ))
    }

    /// Partition for one module, with its per-activity breakdown.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::UnknownModule` when the module is not part of the course.
    pub fn module_completion(
        &self,
        module: &ModuleTag,
    ) -> Result<ModuleCompletion, CompletionError> {
        let module = self.module(module)?;
        Ok(self.compute_module(module).0)
    }

    /// Partition for the whole course, with every module and activity breakdown.
    #[must_use]
    pub fn course_completion(&self) -> CourseCompletion {
        let universe = self.progress.all_learner_ids();
        let mut modules = Vec::with_capacity(self.course.modules().len());
        let mut finished_per_module = Vec::with_capacity(self.course.modules().len());

        for module in self.course.modules() {
            let (completion, finished) = self.compute_module(module);
            modules.push(completion);
            finished_per_module.push(finished);
        }

        let finished = intersect_all(finished_per_module.iter());
        CourseCompletion {
            course: self.course.tag().clone(),
            modules,
            partition: CompletionPartition::split(&finished, universe),
        }
    }

    fn compute_module(&self, module: &Module) -> (ModuleCompletion, BTreeSet<LearnerId>) {
        let universe = self.progress.all_learner_ids();
        let per_activity: Vec<_> = module
            .activities()
            .iter()
            .map(|a| {
                (
                    a.tag(),
                    self.progress.finished_learner_ids(module.tag(), Some(a.tag())),
                )
            })
            .collect();

        let finished = intersect_all(per_activity.iter().map(|(_, set)| *set));
        let activities = per_activity
            .iter()
            .map(|(tag, set)| ActivityCompletion {
                activity: (*tag).clone(),
                partition: CompletionPartition::split(set, universe),
            })
            .collect();

        let completion = ModuleCompletion {
            module: module.tag().clone(),
            activities,
            partition: CompletionPartition::split(&finished, universe),
        };
        (completion, finished)
    }

    fn module(&self, tag: &ModuleTag) -> Result<&'a Module, CompletionError> {
        self.course
            .module(tag)
            .ok_or_else(|| CompletionError::UnknownModule {
                course: self.course.tag().clone(),
                module: tag.clone(),
            })
    }
}

/// Chained intersection seeded by the first set; no sets means nobody.
fn intersect_all<'s>(
    mut sets: impl Iterator<Item = &'s BTreeSet<LearnerId>>,
) -> BTreeSet<LearnerId> {
    let Some(first) = sets.next() else {
        return BTreeSet::new();
    };
    sets.fold(first.clone(), |acc, next| {
        acc.intersection(next).cloned().collect()
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
