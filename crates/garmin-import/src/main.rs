use std::path::PathBuf;

use clap::{Parser, Subcommand};
use garmin_import::cli::commands::{self, ImportArgs};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "garmin_import=info";

#[derive(Parser)]
#[command(name = "garmin-import")]
#[command(author, version, about = "Import Garmin export bundles into a local database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import daily and activity bundles
    Import {
        /// Database path (default: ~/.local/share/garmin/garmin.db)
        #[arg(long, env = "GARMIN_IMPORT_DB")]
        db: Option<PathBuf>,

        /// Directory containing the export bundles
        #[arg(long, env = "GARMIN_EXPORT_DIR")]
        export_dir: Option<PathBuf>,

        /// User the imported rows belong to
        #[arg(long, env = "GARMIN_USER_ID")]
        user_id: String,

        /// Import this daily bundle instead of scanning (repeatable)
        #[arg(long = "daily-file")]
        daily_files: Vec<PathBuf>,

        /// Import this activity bundle instead of scanning (repeatable)
        #[arg(long = "activities-file")]
        activity_files: Vec<PathBuf>,

        /// Only import the most recent daily bundle
        #[arg(long)]
        daily_latest: bool,

        /// Only import the most recent activity bundle
        #[arg(long)]
        activities_latest: bool,

        /// Skip row count checks after importing
        #[arg(long)]
        no_verify: bool,
    },
    /// Show row counts and date ranges of an existing database
    Verify {
        /// Database path (default: ~/.local/share/garmin/garmin.db)
        #[arg(long, env = "GARMIN_IMPORT_DB")]
        db: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    // A missing .env is fine
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Import {
            db,
            export_dir,
            user_id,
            daily_files,
            activity_files,
            daily_latest,
            activities_latest,
            no_verify,
        } => commands::import_run(ImportArgs {
            db_path: db,
            export_dir,
            user_id,
            daily_files,
            activity_files,
            daily_latest,
            activities_latest,
            no_verify,
        }),
        Commands::Verify { db } => commands::verify_only(db),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", garmin_import::error::format_user_error(&e));
        std::process::exit(1);
    }
}
