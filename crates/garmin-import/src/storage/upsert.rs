//! Idempotent insert-or-update keyed by a row's natural key
//!
//! Every write is a single `INSERT ... ON CONFLICT (...) DO UPDATE` statement.
//! Nothing is read back before writing.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::db::schema::Relation;
use crate::error::{ImportError, Result};

/// How a mutable column is merged when the natural key already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRule {
    /// Take the incoming value, including NULL
    Overwrite,
    /// Take the incoming value unless it is NULL
    KeepExistingWhenNull,
}

/// A normalized row that knows its relation and conflict policy
pub trait UpsertRow {
    /// Destination relation
    const RELATION: Relation;

    /// Columns forming the natural key
    const KEY_COLUMNS: &'static [&'static str];

    /// Columns updated on conflict; every other column is insert-only
    const UPDATE_COLUMNS: &'static [(&'static str, MergeRule)];

    /// Column names paired with their values, in insert order
    fn columns(&self) -> Vec<(&'static str, Value)>;

    /// Natural key rendered for error reports
    fn natural_key(&self) -> String;
}

/// Build the upsert statement for `R` over the given column list
pub fn upsert_statement<R: UpsertRow>(columns: &[&str]) -> Result<String> {
    let table = R::RELATION.table_name();

    for key in R::KEY_COLUMNS {
        if !columns.contains(key) {
            return Err(ImportError::invalid_param(format!(
                "{}: key column '{}' is not among the row columns",
                table, key
            )));
        }
    }
    for (col, _) in R::UPDATE_COLUMNS {
        if !columns.contains(col) || R::KEY_COLUMNS.contains(col) {
            return Err(ImportError::invalid_param(format!(
                "{}: '{}' cannot be updated on conflict",
                table, col
            )));
        }
    }

    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    let conflict_action = if R::UPDATE_COLUMNS.is_empty() {
        "DO NOTHING".to_string()
    } else {
        let assignments: Vec<String> = R::UPDATE_COLUMNS
            .iter()
            .map(|(col, rule)| match rule {
                MergeRule::Overwrite => format!("{col} = excluded.{col}"),
                MergeRule::KeepExistingWhenNull => {
                    format!("{col} = COALESCE(excluded.{col}, {table}.{col})")
                }
            })
            .collect();
        format!("DO UPDATE SET {}", assignments.join(", "))
    };

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) {}",
        table,
        columns.join(", "),
        placeholders.join(", "),
        R::KEY_COLUMNS.join(", "),
        conflict_action
    ))
}

/// Write one row; store failures come back tagged with relation and key
pub fn upsert<R: UpsertRow>(conn: &Connection, row: &R) -> Result<()> {
    let (names, values): (Vec<&'static str>, Vec<Value>) = row.columns().into_iter().unzip();
    let sql = upsert_statement::<R>(&names)?;

    conn.prepare_cached(&sql)
        .and_then(|mut stmt| stmt.execute(params_from_iter(values.iter())))
        .map_err(|e| ImportError::upsert(R::RELATION.table_name(), row.natural_key(), &e))?;

    Ok(())
}
