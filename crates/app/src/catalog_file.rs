//! JSON file holding the curriculum and the learner directory.

use std::path::Path;

use learn_core::model::{
    Activity, ActivityTag, Course, CourseTag, LearnerId, LearnerProfile, LearnerRole, Module,
    ModuleTag,
};
use serde::Deserialize;
use services::StaticCatalog;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogFileError {
    #[error("cannot read catalog {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid catalog json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Model(#[from] learn_core::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    #[serde(default)]
    courses: Vec<CourseEntry>,
    #[serde(default)]
    learners: Vec<LearnerEntryFile>,
}

#[derive(Debug, Deserialize)]
struct CourseEntry {
    tag: CourseTag,
    title: String,
    #[serde(default)]
    scripted: bool,
    #[serde(default)]
    modules: Vec<ModuleEntry>,
}

#[derive(Debug, Deserialize)]
struct ModuleEntry {
    tag: ModuleTag,
    title: String,
    #[serde(default)]
    scripted: bool,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    activities: Vec<ActivityEntry>,
}

#[derive(Debug, Deserialize)]
struct ActivityEntry {
    tag: ActivityTag,
    title: String,
}

#[derive(Debug, Deserialize)]
struct LearnerEntryFile {
    id: LearnerId,
    display_name: String,
    #[serde(default)]
    admin: bool,
}

fn default_active() -> bool {
    true
}

impl CatalogFile {
    /// # Errors
    ///
    /// Returns `CatalogFileError` if the file is unreadable or not a valid catalog.
    pub fn load(path: &Path) -> Result<Self, CatalogFileError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogFileError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// # Errors
    ///
    /// Returns `CatalogFileError::Json` on malformed input.
    pub fn parse(raw: &str) -> Result<Self, CatalogFileError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Validate the curriculum and build an in-memory catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogFileError::Model` on duplicate module or activity tags.
    pub fn into_catalog(self) -> Result<StaticCatalog, CatalogFileError> {
        let courses = self
            .courses
            .into_iter()
            .map(CourseEntry::into_course)
            .collect::<Result<Vec<_>, _>>()?;
        let learners = self.learners.into_iter().map(|l| {
            let role = if l.admin {
                LearnerRole::Admin
            } else {
                LearnerRole::Learner
            };
            LearnerProfile::new(l.id, l.display_name, role)
        });
        Ok(StaticCatalog::new(courses, learners))
    }
}

impl CourseEntry {
    fn into_course(self) -> Result<Course, learn_core::Error> {
        let modules = self
            .modules
            .into_iter()
            .map(|m| {
                let activities = m
                    .activities
                    .into_iter()
                    .map(|a| Activity::new(a.tag, a.title))
                    .collect();
                Module::new(m.tag, m.title, m.scripted, m.active, activities)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Course::new(self.tag, self.title, self.scripted, modules)?)
    }
}
