use std::sync::Arc;

use learn_core::model::{
    ActivityTag, CourseTag, LearnerId, ModuleTag, ProgressRecord, ProgressScope,
};
use tracing::{debug, warn};

use crate::repository::{ProgressStore, StorageError, SubjectFilter, TripleQuery, escape_like};

/// Vocabulary identifier reserved for progress triples.
pub const PROGRESS_PREDICATE: &str = "https://yeswiki.net/vocabulary/progress";

/// Which records of a course a query targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitFilter {
    /// Every record of the course, module-level and activity-level alike.
    Course,
    /// Module-level records of one module only.
    Module(ModuleTag),
    /// Records of one activity.
    Activity(ModuleTag, ActivityTag),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressFilter {
    pub learner: Option<LearnerId>,
    pub course: CourseTag,
    pub unit: UnitFilter,
}

impl ProgressFilter {
    /// Every learner's progress in a course.
    #[must_use]
    pub fn course(course: CourseTag) -> Self {
        Self {
            learner: None,
            course,
            unit: UnitFilter::Course,
        }
    }

    /// Every record one learner holds in a course.
    #[must_use]
    pub fn learner_course(learner: LearnerId, course: CourseTag) -> Self {
        Self {
            learner: Some(learner),
            course,
            unit: UnitFilter::Course,
        }
    }

    /// One learner's record for one exact unit.
    #[must_use]
    pub fn unit(
        learner: LearnerId,
        course: CourseTag,
        module: ModuleTag,
        activity: Option<ActivityTag>,
    ) -> Self {
        let unit = match activity {
            Some(activity) => UnitFilter::Activity(module, activity),
            None => UnitFilter::Module(module),
        };
        Self {
            learner: Some(learner),
            course,
            unit,
        }
    }

    /// `LIKE` pattern over the payload.
    ///
    /// Payloads read `{"course":..,"module":..[,"activity":..],"log_time":..}`,
    /// so a module-level query pins `log_time` right after the module key.
    #[must_use]
    pub fn object_pattern(&self) -> String {
        let mut literal = format!("{{\"course\":{},", json_str(self.course.as_str()));
        match &self.unit {
            UnitFilter::Course => {}
            UnitFilter::Module(module) => {
                literal.push_str(&format!(
                    "\"module\":{},\"log_time\":",
                    json_str(module.as_str())
                ));
            }
            UnitFilter::Activity(module, activity) => {
                literal.push_str(&format!(
                    "\"module\":{},\"activity\":{},\"log_time\":",
                    json_str(module.as_str()),
                    json_str(activity.as_str())
                ));
            }
        }
        let mut pattern = escape_like(&literal);
        pattern.push('%');
        pattern
    }

    /// Re-checks a decoded record against the filter.
    #[must_use]
    pub fn matches(&self, record: &ProgressRecord) -> bool {
        if self.learner.as_ref().is_some_and(|l| *l != record.learner_id)
            || record.course != self.course
        {
            return false;
        }
        match &self.unit {
            UnitFilter::Course => true,
            UnitFilter::Module(module) => {
                record.module == *module && record.scope == ProgressScope::Module
            }
            UnitFilter::Activity(module, activity) => {
                record.module == *module && record.activity() == Some(activity)
            }
        }
    }

    fn to_query(&self) -> TripleQuery {
        let subject = match &self.learner {
            Some(learner) => SubjectFilter::Exact(learner.as_str().to_owned()),
            None => SubjectFilter::Any,
        };
        TripleQuery::object_like(subject, PROGRESS_PREDICATE, self.object_pattern())
    }
}

fn json_str(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// Converts store triples into `ProgressRecord`s and back.
#[derive(Clone)]
pub struct ProgressRepository {
    store: Arc<dyn ProgressStore>,
}

impl ProgressRepository {
    #[must_use]
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Fetch every record matching `filter`, in store order.
    ///
    /// Triples that do not decode are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    pub async fn find(&self, filter: &ProgressFilter) -> Result<Vec<ProgressRecord>, StorageError> {
        let triples = self.store.query(&filter.to_query()).await?;
        let fetched = triples.len();
        let mut records = Vec::with_capacity(fetched);

        for triple in triples {
            let learner = match LearnerId::new(triple.resource) {
                Ok(learner) => learner,
                Err(e) => {
                    warn!(error = %e, payload = %triple.value, "skipping progress without learner");
                    continue;
                }
            };
            match ProgressRecord::decode_payload(learner, &triple.value) {
                Ok(record) if filter.matches(&record) => records.push(record),
                Ok(record) => {
                    debug!(
                        learner = %record.learner_id,
                        payload = %triple.value,
                        "pattern hit outside filter"
                    );
                }
                Err(e) => {
                    warn!(error = %e, payload = %triple.value, "skipping corrupt progress payload");
                }
            }
        }

        debug!(
            course = %filter.course,
            fetched,
            kept = records.len(),
            "progress query"
        );
        Ok(records)
    }

    /// First record matching `filter`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    pub async fn find_one(
        &self,
        filter: &ProgressFilter,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        Ok(self.find(filter).await?.into_iter().next())
    }

    /// Append a record. Callers check for an existing record first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn insert(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        self.store
            .insert(
                record.learner_id.as_str(),
                PROGRESS_PREDICATE,
                &record.encode_payload(),
            )
            .await
    }
}
