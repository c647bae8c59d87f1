use std::collections::{BTreeSet, HashMap};

use crate::completion::CompletionError;
use crate::model::{ActivityTag, CourseTag, LearnerId, ModuleTag, ProgressRecord, ProgressScope};

static NOBODY: BTreeSet<LearnerId> = BTreeSet::new();

#[derive(Debug, Default)]
struct ModuleIndex {
    module_level: BTreeSet<LearnerId>,
    activities: HashMap<ActivityTag, BTreeSet<LearnerId>>,
}

/// Read-only index over every progress record of one course.
///
/// Built once per dashboard computation from a single bulk fetch and never
/// mutated afterwards. Duplicate records collapse into set membership.
#[derive(Debug)]
pub struct ProgressCollection {
    course: CourseTag,
    learners: BTreeSet<LearnerId>,
    modules: HashMap<ModuleTag, ModuleIndex>,
}

impl ProgressCollection {
    /// Indexes `records`, all of which must belong to `course`.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::CourseMismatch` if a record belongs to another course.
    pub fn from_records(
        course: CourseTag,
        records: impl IntoIterator<Item = ProgressRecord>,
    ) -> Result<Self, CompletionError> {
        let mut learners = BTreeSet::new();
        let mut modules: HashMap<ModuleTag, ModuleIndex> = HashMap::new();

        for record in records {
            if record.course != course {
                return Err(CompletionError::CourseMismatch {
                    expected: course,
                    found: record.course,
                });
            }
            let index = modules.entry(record.module).or_default();
            match record.scope {
                ProgressScope::Module => {
                    index.module_level.insert(record.learner_id.clone());
                }
                ProgressScope::Activity(activity) => {
                    index
                        .activities
                        .entry(activity)
                        .or_default()
                        .insert(record.learner_id.clone());
                }
            }
            learners.insert(record.learner_id);
        }

        Ok(Self {
            course,
            learners,
            modules,
        })
    }

    /// A collection for a course nobody has started.
    #[must_use]
    pub fn empty(course: CourseTag) -> Self {
        Self {
            course,
            learners: BTreeSet::new(),
            modules: HashMap::new(),
        }
    }

    #[must_use]
    pub fn course(&self) -> &CourseTag {
        &self.course
    }

    /// Every learner with at least one record in the course.
    #[must_use]
    pub fn all_learner_ids(&self) -> &BTreeSet<LearnerId> {
        &self.learners
    }

    /// Learners who finished `activity` of `module`, or who hold a
    /// module-level record when `activity` is `None`.
    #[must_use]
    pub fn finished_learner_ids(
        &self,
        module: &ModuleTag,
        activity: Option<&ActivityTag>,
    ) -> &BTreeSet<LearnerId> {
        let Some(index) = self.modules.get(module) else {
            return &NOBODY;
        };
        match activity {
            None => &index.module_level,
            Some(activity) => index.activities.get(activity).unwrap_or(&NOBODY),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.learners.is_empty()
    }
}
