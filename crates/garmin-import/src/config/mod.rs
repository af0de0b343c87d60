//! Run configuration for the importer
//!
//! The CLI layer resolves flags, environment and `.env` into an
//! [`ImportConfig`]; the core only ever sees the validated value.

use std::path::{Path, PathBuf};

use crate::error::{ImportError, Result};

/// Default data directory name
const DATA_DIR_NAME: &str = "garmin";

/// Default database file inside the data directory
const DB_FILE_NAME: &str = "garmin.db";

/// Directory the exporter writes bundles into
pub const DEFAULT_EXPORT_DIR: &str = "garmin_exports";

/// Get the data directory path
/// Returns ~/.local/share/garmin on Unix, ~/Library/Application Support/garmin on macOS
pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|p| p.join(DATA_DIR_NAME))
        .ok_or_else(|| ImportError::config("Could not determine data directory"))
}

/// Get the default database path
pub fn default_db_path() -> Result<PathBuf> {
    data_dir().map(|p| p.join(DB_FILE_NAME))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Which files of one category to import
#[derive(Debug, Clone, Default)]
pub struct SourceSelection {
    /// Explicit files; when non-empty, directory scanning is skipped
    pub files: Vec<PathBuf>,
    /// Only import the most recent matching file
    pub only_latest: bool,
}

/// Fully resolved configuration for one import run
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// SQLite database file
    pub db_path: PathBuf,
    /// Directory scanned for export bundles
    pub export_dir: PathBuf,
    /// Identity every imported row is attributed to
    pub user_id: String,
    /// Daily bundle selection
    pub daily: SourceSelection,
    /// Activity bundle selection
    pub activities: SourceSelection,
    /// Run aggregate checks after importing
    pub verify: bool,
}

impl ImportConfig {
    pub fn new(db_path: impl Into<PathBuf>, user_id: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            user_id: user_id.into(),
            daily: SourceSelection::default(),
            activities: SourceSelection::default(),
            verify: true,
        }
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Reject values the core cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(ImportError::config("user id must not be empty"));
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(ImportError::config("database path must not be empty"));
        }
        Ok(())
    }
}
