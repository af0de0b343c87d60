//! Source document models for Garmin export bundles

pub mod bundle;

pub use bundle::{
    ActivityBundle, ActivityBundleMetadata, BundleMetadata, DailyBundle,
    DayRecord,
};
