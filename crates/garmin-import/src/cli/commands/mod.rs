pub mod import;

pub use import::{run as import_run, verify_only, ImportArgs};
