mod catalog_file;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use learn_core::completion::CompletionPartition;
use learn_core::model::{
    ActivityTag, CourseTag, LearnerEntry, LearnerId, ModuleTag, TrackingConfig,
};
use learn_core::navigation::{Navigation, Stop, Waypoint};
use services::{AppServices, Clock, CourseDashboard, ModuleDashboard, StaticCatalog};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use crate::catalog_file::CatalogFile;

#[derive(Parser, Debug)]
#[command(name = "app")]
#[command(about = "Learner progress tracking and completion dashboards")]
struct Args {
    /// SQLite database url or path
    #[arg(long = "db", env = "LEARN_DB_URL", default_value = "sqlite://progress.sqlite3")]
    db_url: String,

    /// JSON file with courses and learners
    #[arg(long, env = "LEARN_CATALOG")]
    catalog: Option<PathBuf>,

    /// Record progress for administrators too
    #[arg(long, env = "LEARN_SAVE_PROGRESS_FOR_ADMINS")]
    save_progress_for_admins: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mark an activity, or a whole module, finished for a learner
    Record {
        #[arg(long)]
        learner: LearnerId,
        #[arg(long)]
        course: CourseTag,
        #[arg(long)]
        module: ModuleTag,
        #[arg(long)]
        activity: Option<ActivityTag>,
    },
    /// Print who finished a course, or one of its modules
    Dashboard {
        #[arg(long)]
        course: CourseTag,
        #[arg(long)]
        module: Option<ModuleTag>,
    },
    /// Show where a learner can go from a course, module or activity page
    Next {
        #[arg(long)]
        learner: LearnerId,
        #[arg(long)]
        course: CourseTag,
        #[arg(long)]
        module: Option<ModuleTag>,
        #[arg(long, requires = "module")]
        activity: Option<ActivityTag>,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("invalid --db value: {raw}")]
struct InvalidDbUrl {
    raw: String,
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn load_catalog(path: Option<&Path>) -> Result<StaticCatalog, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(CatalogFile::load(path)?.into_catalog()?),
        None => {
            warn!("no catalog given, every course is unknown");
            Ok(StaticCatalog::default())
        }
    }
}

fn display_names(ids: &[LearnerId], learners: &[LearnerEntry]) -> String {
    if ids.is_empty() {
        return "-".into();
    }
    ids.iter()
        .map(|id| {
            learners
                .binary_search_by(|entry| entry.id.cmp(id))
                .map_or_else(|_| id.to_string(), |idx| learners[idx].display_name.clone())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_partition(
    indent: &str,
    label: &str,
    partition: &CompletionPartition,
    learners: &[LearnerEntry],
) {
    println!("{indent}{label}");
    println!(
        "{indent}  finished:     {}",
        display_names(&partition.finished, learners)
    );
    println!(
        "{indent}  not finished: {}",
        display_names(&partition.not_finished, learners)
    );
}

fn print_course(dashboard: &CourseDashboard) {
    let completion = &dashboard.completion;
    let learners = &dashboard.learners;
    let label = format!("course {}", completion.course);
    print_partition("", &label, &completion.partition, learners);
    for module in &completion.modules {
        let label = format!("module {}", module.module);
        print_partition("  ", &label, &module.partition, learners);
    }
}

fn print_module(dashboard: &ModuleDashboard) {
    let completion = &dashboard.completion;
    let learners = &dashboard.learners;
    let label = format!("course {} module {}", dashboard.course, completion.module);
    print_partition("", &label, &completion.partition, learners);
    for activity in &completion.activities {
        let label = format!("activity {}", activity.activity);
        print_partition("  ", &label, &activity.partition, learners);
    }
}

fn describe(waypoint: Option<&Waypoint>) -> String {
    let Some(waypoint) = waypoint else {
        return "-".into();
    };
    let place = match &waypoint.stop {
        Stop::Course => "course entry".to_string(),
        Stop::Module(module) => format!("module {module}"),
        Stop::Activity(module, activity) => format!("activity {module}/{activity}"),
    };
    if waypoint.unlocked {
        place
    } else {
        format!("{place} (locked)")
    }
}

fn print_navigation(navigation: &Navigation) {
    println!("previous: {}", describe(navigation.previous.as_ref()));
    println!("next:     {}", describe(navigation.next.as_ref()));
}

async fn run(args: Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let catalog = Arc::new(load_catalog(args.catalog.as_deref())?);
    let db_url = normalize_sqlite_url(args.db_url);

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&db_url)?;
    let app = AppServices::new_sqlite(
        &db_url,
        catalog.clone(),
        catalog,
        TrackingConfig {
            save_progress_for_admins: args.save_progress_for_admins,
        },
        Clock::default(),
    )
    .await?;

    match args.command {
        Command::Record {
            learner,
            course,
            module,
            activity,
        } => {
            let progress = app.progress();
            let recorded = match &activity {
                Some(activity) => {
                    progress
                        .record_activity_completion(&learner, &course, &module, activity)
                        .await?
                }
                None => {
                    progress
                        .record_module_completion(&learner, &course, &module)
                        .await?
                }
            };
            println!("{}", if recorded { "recorded" } else { "skipped" });
            Ok(ExitCode::SUCCESS)
        }
        Command::Dashboard { course, module } => {
            let completion = app.completion();
            let shown = match &module {
                Some(module) => completion
                    .compute_module_completion(&course, module)
                    .await
                    .map(|d| print_module(&d)),
                None => completion
                    .compute_course_completion(&course)
                    .await
                    .map(|d| print_course(&d)),
            };
            match shown {
                Ok(()) => Ok(ExitCode::SUCCESS),
                Err(err) => {
                    error!(error = %err, transient = err.is_transient(), "dashboard failed");
                    println!("no data available for this course");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Next {
            learner,
            course,
            module,
            activity,
        } => {
            let here = match (module, activity) {
                (None, _) => Stop::Course,
                (Some(module), None) => Stop::Module(module),
                (Some(module), Some(activity)) => Stop::Activity(module, activity),
            };
            match app.progress().navigation(&learner, &course, &here).await? {
                Some(navigation) => {
                    print_navigation(&navigation);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    println!("course {course} is not in the curriculum");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            // At this layer (binary glue), printing once is fine.
            eprintln!("{err}");
            ExitCode::from(2)
        }
    }
}
