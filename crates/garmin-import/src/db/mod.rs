//! Destination relations: row models and schema
//!
//! Each row model implements [`crate::storage::UpsertRow`], declaring its
//! natural key and which columns a re-import may change.

pub mod models;
pub mod schema;

pub use models::*;
pub use schema::Relation;
