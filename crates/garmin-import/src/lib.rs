pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod storage;

pub use error::{ImportError, Result};
pub use import::{Importer, RunOutcome};
pub use storage::Database;
