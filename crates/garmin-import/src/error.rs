use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// How a store failure should be read by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// A constraint other than the declared conflict key rejected the row
    Constraint,
    /// The database could not be reached, opened, or was locked
    Connection,
    /// Type coercion or any other statement failure
    Other,
}

impl StoreErrorKind {
    /// Classify a rusqlite error by its SQLite result code
    pub fn classify(err: &rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => StoreErrorKind::Constraint,
            Some(ErrorCode::CannotOpen)
            | Some(ErrorCode::DatabaseBusy)
            | Some(ErrorCode::DatabaseLocked)
            | Some(ErrorCode::NotADatabase)
            | Some(ErrorCode::SystemIoFailure)
            | Some(ErrorCode::PermissionDenied)
            | Some(ErrorCode::ReadOnly) => StoreErrorKind::Connection,
            _ => StoreErrorKind::Other,
        }
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreErrorKind::Constraint => write!(f, "constraint violation"),
            StoreErrorKind::Connection => write!(f, "connection failure"),
            StoreErrorKind::Other => write!(f, "statement failure"),
        }
    }
}

/// Main error type for garmin-import
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Upsert into {relation} failed for key {key} ({kind}): {message}")]
    Upsert {
        relation: &'static str,
        key: String,
        kind: StoreErrorKind,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, ImportError>;

impl ImportError {
    /// Create a configuration error from a message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a record-level normalization error from a message
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }

    /// Create an invalid parameter error from a message
    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Wrap a store error raised while writing one row
    pub fn upsert(relation: &'static str, key: impl Into<String>, err: &rusqlite::Error) -> Self {
        Self::Upsert {
            relation,
            key: key.into(),
            kind: StoreErrorKind::classify(err),
            message: err.to_string(),
        }
    }
}

/// Render an error for the terminal, with a hint where one helps
pub fn format_user_error(err: &ImportError) -> String {
    match err {
        ImportError::Config(_) => format!(
            "{}\nHint: pass --user-id or set GARMIN_USER_ID (a .env file is read too).",
            err
        ),
        ImportError::FileNotFound(_) => format!(
            "{}\nHint: paths given with --daily-file/--activities-file must exist.",
            err
        ),
        ImportError::Upsert {
            kind: StoreErrorKind::Connection,
            ..
        } => format!("{}\nHint: check that the database file is writable.", err),
        _ => err.to_string(),
    }
}
