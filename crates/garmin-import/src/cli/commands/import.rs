//! Import commands for garmin-import

use std::path::{Path, PathBuf};

use crate::config::{ImportConfig, SourceSelection};
use crate::error::Result;
use crate::import::{verify, Importer, RunOutcome, VerificationReport};
use crate::storage::Database;

/// Flags for one import run
#[derive(Debug, Clone, Default)]
pub struct ImportArgs {
    pub db_path: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub user_id: String,
    pub daily_files: Vec<PathBuf>,
    pub activity_files: Vec<PathBuf>,
    pub daily_latest: bool,
    pub activities_latest: bool,
    pub no_verify: bool,
}

impl ImportArgs {
    fn into_config(self) -> Result<ImportConfig> {
        let db_path = match self.db_path {
            Some(path) => path,
            None => crate::config::default_db_path()?,
        };

        let mut config = ImportConfig::new(db_path, self.user_id);
        if let Some(dir) = self.export_dir {
            config = config.with_export_dir(dir);
        }
        config.daily = SourceSelection {
            files: self.daily_files,
            only_latest: self.daily_latest,
        };
        config.activities = SourceSelection {
            files: self.activity_files,
            only_latest: self.activities_latest,
        };
        config.verify = !self.no_verify;
        Ok(config)
    }
}

/// Run an import and print the summary
pub fn run(args: ImportArgs) -> Result<()> {
    let config = args.into_config()?;

    println!("Using database: {}", config.db_path.display());
    println!("Reading exports from: {}", config.export_dir.display());

    let mut importer = Importer::new(config);
    match importer.run()? {
        RunOutcome::NothingToDo => {
            println!("No export files found. Nothing to import.");
        }
        RunOutcome::Completed {
            stats,
            verification,
        } => {
            println!();
            println!("{}", stats);
            if !verification.is_empty() {
                println!();
                print_verification(&verification);
            }
        }
    }

    Ok(())
}

/// Report what an existing database holds
pub fn verify_only(db_path: Option<PathBuf>) -> Result<()> {
    let db_path = match db_path {
        Some(path) => path,
        None => crate::config::default_db_path()?,
    };

    if !Path::new(&db_path).exists() {
        println!("No database found at: {}", db_path.display());
        println!("Run 'garmin-import import' to create one.");
        return Ok(());
    }

    let db = Database::connect(&db_path)?;
    println!("Database: {}", db_path.display());
    println!();
    print_verification(&verify(&db));
    db.close()
}

fn print_verification(reports: &[VerificationReport]) {
    println!("Data stored:");
    for report in reports {
        println!("{}", report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_into_config() {
        let args = ImportArgs {
            db_path: Some(PathBuf::from("/tmp/x.db")),
            export_dir: Some(PathBuf::from("/tmp/exports")),
            user_id: "u1".to_string(),
            daily_files: vec![PathBuf::from("d.json")],
            activities_latest: true,
            no_verify: true,
            ..Default::default()
        };

        let config = args.into_config().unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.export_dir, PathBuf::from("/tmp/exports"));
        assert_eq!(config.daily.files, vec![PathBuf::from("d.json")]);
        assert!(!config.daily.only_latest);
        assert!(config.activities.only_latest);
        assert!(!config.verify);
    }

    #[test]
    fn test_verify_only_missing_database() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("absent.db");
        verify_only(Some(path.clone())).unwrap();
        assert!(!path.exists());
    }
}
