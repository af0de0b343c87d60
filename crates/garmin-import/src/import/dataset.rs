//! Per-category import loop with record-level failure isolation

use crate::error::Result;
use crate::import::normalize::Normalized;
use crate::import::stats::{Category, CategoryOutcome, RecordError};
use crate::storage::{Database, UpsertRow};

/// How often progress is logged
const PROGRESS_EVERY: usize = 100;

/// Normalize and upsert every record of one category
///
/// A record that fails either step is counted and logged; the loop always
/// runs to the end of `records`.
pub fn import_dataset<S, T, I, F>(
    db: &Database,
    category: Category,
    records: I,
    mut normalize: F,
) -> CategoryOutcome
where
    I: IntoIterator<Item = (String, S)>,
    F: FnMut(S) -> Result<Normalized<T>>,
    T: UpsertRow,
{
    let mut outcome = CategoryOutcome::default();

    for (index, (identity, record)) in records.into_iter().enumerate() {
        let result = normalize(record).and_then(|normalized| match normalized {
            Normalized::Row(row) => db.upsert(&row).map(|_| true),
            Normalized::Skip => Ok(false),
        });

        match result {
            Ok(true) => outcome.imported += 1,
            Ok(false) => outcome.skipped += 1,
            Err(e) => {
                tracing::warn!(
                    category = %category,
                    record = %identity,
                    error = %e,
                    "record failed, continuing"
                );
                outcome.errors.push(RecordError {
                    identity,
                    message: e.to_string(),
                });
            }
        }

        if (index + 1) % PROGRESS_EVERY == 0 {
            tracing::debug!(
                category = %category,
                processed = index + 1,
                imported = outcome.imported,
                errors = outcome.error_count(),
                "import progress"
            );
        }
    }

    tracing::info!(
        category = %category,
        imported = outcome.imported,
        skipped = outcome.skipped,
        errors = outcome.error_count(),
        "category imported"
    );

    outcome
}
