//! Command-line surface for garmin-import

pub mod commands;
