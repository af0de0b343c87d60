//! Import pipeline for Garmin export bundles
//!
//! Provides:
//! - Export file discovery with an all / only-latest policy
//! - Record normalization from export sections to typed rows
//! - Per-category import loops that isolate failing records
//! - Post-import verification of row counts and date bounds

pub mod dataset;
pub mod files;
pub mod normalize;
pub mod stats;
pub mod verify;

use std::path::{Path, PathBuf};

use tracing::field;

use crate::config::ImportConfig;
use crate::error::{ImportError, Result};
use crate::models::{ActivityBundle, DailyBundle, DayRecord};
use crate::storage::Database;

pub use dataset::import_dataset;
pub use files::{select_files, FilePattern, Selection};
pub use normalize::Normalized;
pub use stats::{Category, CategoryOutcome, ImportStats, RecordError};
pub use verify::{verify, VerificationReport};

/// How a run ended when it did not fail
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// No daily or activity files matched
    NothingToDo,
    Completed {
        stats: ImportStats,
        /// Empty when verification is disabled
        verification: Vec<VerificationReport>,
    },
}

/// Runs one import from the export directory into the store
pub struct Importer {
    config: ImportConfig,
    db: Option<Database>,
}

impl Importer {
    pub fn new(config: ImportConfig) -> Self {
        Self { config, db: None }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Whether a store connection is currently held
    pub fn is_connected(&self) -> bool {
        self.db.is_some()
    }

    /// Import every selected file, then verify
    ///
    /// Record failures are counted in the returned stats. Any other error
    /// ends the run; the store connection is released either way.
    pub fn run(&mut self) -> Result<RunOutcome> {
        let span = tracing::info_span!(
            "garmin_import.run",
            source_dir = %self.config.export_dir.display(),
            database = %self.config.db_path.display(),
            user_id = %self.config.user_id,
            status = field::Empty,
            error = field::Empty,
        );
        let _enter = span.enter();

        let result = self
            .config
            .validate()
            .and_then(|_| self.connect())
            .and_then(|_| self.import());

        let closed = self.disconnect();
        let result = match (result, closed) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), closed) => {
                if let Err(close_error) = closed {
                    tracing::warn!(error = %close_error, "failed to close database after error");
                }
                Err(e)
            }
        };

        match &result {
            Ok(_) => {
                span.record("status", "ok");
            }
            Err(e) => {
                span.record("status", "error");
                span.record("error", field::display(e));
                tracing::error!(error = %e, "import failed");
            }
        }

        result
    }

    fn connect(&mut self) -> Result<()> {
        let db = Database::connect(&self.config.db_path)?;
        tracing::debug!(database = %db.label(), "connected");
        self.db = Some(db);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        match self.db.take() {
            Some(db) => db.close(),
            None => Ok(()),
        }
    }

    fn import(&self) -> Result<RunOutcome> {
        let db = self
            .db
            .as_ref()
            .ok_or_else(|| ImportError::Database("Not connected".to_string()))?;

        let daily_files = select_files(
            &self.config.export_dir,
            FilePattern::DAILY,
            Selection::from(&self.config.daily),
            &self.config.daily.files,
        );
        let activity_files = select_files(
            &self.config.export_dir,
            FilePattern::ACTIVITIES,
            Selection::from(&self.config.activities),
            &self.config.activities.files,
        );

        if daily_files.is_empty() && activity_files.is_empty() {
            tracing::info!(
                dir = %self.config.export_dir.display(),
                "no export files found, nothing to import"
            );
            return Ok(RunOutcome::NothingToDo);
        }

        tracing::info!(
            daily_files = daily_files.len(),
            activity_files = activity_files.len(),
            "starting import"
        );

        let mut stats = ImportStats::default();

        for path in &daily_files {
            self.import_daily_file(db, path, &mut stats)?;
            stats.files += 1;
        }

        for path in &activity_files {
            self.import_activity_file(db, path, &mut stats)?;
            stats.files += 1;
        }

        let verification = if self.config.verify {
            verify(db)
        } else {
            Vec::new()
        };

        tracing::info!(
            files = stats.files,
            imported = stats.total_imported(),
            errors = stats.total_errors(),
            "import complete"
        );

        Ok(RunOutcome::Completed {
            stats,
            verification,
        })
    }

    fn import_daily_file(&self, db: &Database, path: &Path, stats: &mut ImportStats) -> Result<()> {
        let bundle = DailyBundle::from_json(path, &read_file(path)?)?;
        let meta = &bundle.metadata;
        tracing::info!(
            file = %path.display(),
            start = meta.start_date.as_deref().unwrap_or("?"),
            end = meta.end_date.as_deref().unwrap_or("?"),
            extracted = meta.extraction_date.as_deref().unwrap_or("?"),
            data_types = %meta.data_types.join(","),
            records = bundle.data.len(),
            "reading daily bundle"
        );

        let days: Vec<(String, Result<DayRecord>)> = bundle
            .entries()
            .map(|(key, value)| (key.to_string(), DayRecord::from_entry(key, value)))
            .collect();

        let user_id = self.config.user_id.as_str();

        // Only the first day carrying a profile counts, usable or not
        let carrier = days.iter().find_map(|(key, day)| {
            day.as_ref()
                .ok()
                .filter(|d| d.user_profile.is_some())
                .map(|d| (key.clone(), d))
        });
        stats.record(
            Category::Profile,
            import_dataset(db, Category::Profile, carrier, |day| {
                Ok(normalize::normalize_profile(user_id, day))
            }),
        );

        let entries = || days.iter().map(|(key, day)| (key.clone(), day));

        stats.record(
            Category::DailyMetrics,
            import_dataset(db, Category::DailyMetrics, entries(), |day| {
                resolved(day).map(|d| normalize::normalize_daily(user_id, d))
            }),
        );
        stats.record(
            Category::Sleep,
            import_dataset(db, Category::Sleep, entries(), |day| {
                resolved(day).map(|d| normalize::normalize_sleep(user_id, d))
            }),
        );
        stats.record(
            Category::BodyComposition,
            import_dataset(db, Category::BodyComposition, entries(), |day| {
                resolved(day).map(|d| normalize::normalize_body(user_id, d))
            }),
        );

        Ok(())
    }

    fn import_activity_file(
        &self,
        db: &Database,
        path: &Path,
        stats: &mut ImportStats,
    ) -> Result<()> {
        let bundle = ActivityBundle::from_json(path, &read_file(path)?)?;
        let actual = bundle.activities.len();

        match bundle.metadata.activity_count {
            Some(declared) if declared as usize != actual => tracing::warn!(
                file = %path.display(),
                declared,
                actual,
                "activity count does not match metadata"
            ),
            _ => tracing::info!(
                file = %path.display(),
                extracted = bundle.metadata.extraction_date.as_deref().unwrap_or("?"),
                activities = actual,
                "reading activity bundle"
            ),
        }

        let user_id = self.config.user_id.as_str();
        let records = bundle
            .activities
            .iter()
            .enumerate()
            .map(|(index, entry)| (bundle.identity(index), entry));

        stats.record(
            Category::Activities,
            import_dataset(db, Category::Activities, records, |entry| {
                ActivityBundle::summary(entry)
                    .and_then(|summary| normalize::normalize_activity(user_id, summary))
                    .map(Normalized::Row)
            }),
        );

        Ok(())
    }
}

fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(PathBuf::from(path)));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// A day whose key or shape was unusable fails in every category
fn resolved(day: &Result<DayRecord>) -> Result<&DayRecord> {
    day.as_ref()
        .map_err(|e| ImportError::invalid_record(e.to_string()))
}
