//! Post-import read-only check of row counts and date bounds

use std::fmt;

use crate::db::Relation;
use crate::error::Result;
use crate::storage::Database;

/// What the store holds for one relation after the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub relation: Relation,
    pub rows: Option<i64>,
    pub earliest: Option<String>,
    pub latest: Option<String>,
    /// Set when the relation could not be inspected
    pub error: Option<String>,
}

impl VerificationReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.error {
            return write!(f, "  {:<22} unavailable: {}", self.relation.table_name(), error);
        }
        write!(
            f,
            "  {:<22} {:>8} rows",
            self.relation.table_name(),
            self.rows.unwrap_or(0)
        )?;
        if let (Some(earliest), Some(latest)) = (&self.earliest, &self.latest) {
            write!(f, "  {} .. {}", earliest, latest)?;
        }
        Ok(())
    }
}

/// Inspect every relation; a failing relation never hides the others
pub fn verify(db: &Database) -> Vec<VerificationReport> {
    Relation::ALL
        .iter()
        .map(|&relation| match inspect(db, relation) {
            Ok(report) => {
                tracing::info!(
                    relation = %relation,
                    rows = report.rows.unwrap_or(0),
                    earliest = report.earliest.as_deref().unwrap_or("-"),
                    latest = report.latest.as_deref().unwrap_or("-"),
                    "verified"
                );
                report
            }
            Err(e) => {
                tracing::warn!(relation = %relation, error = %e, "verification failed");
                VerificationReport {
                    relation,
                    rows: None,
                    earliest: None,
                    latest: None,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect()
}

fn inspect(db: &Database, relation: Relation) -> Result<VerificationReport> {
    let table = relation.table_name();
    let (rows, earliest, latest) = match relation.date_column() {
        Some(column) => db.query_row(
            &format!(
                "SELECT COUNT(*), MIN({column}), MAX({column}) FROM {table}",
                column = column,
                table = table
            ),
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?,
        None => (db.count(table)?, None, None),
    };

    Ok(VerificationReport {
        relation,
        rows: Some(rows),
        earliest,
        latest,
        error: None,
    })
}
