//! Per-category counters and the end-of-run summary

use std::collections::BTreeMap;
use std::fmt;

/// Data category imported from the export bundles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Profile,
    DailyMetrics,
    Sleep,
    BodyComposition,
    Activities,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Profile,
        Category::DailyMetrics,
        Category::Sleep,
        Category::BodyComposition,
        Category::Activities,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Profile => "profile",
            Category::DailyMetrics => "daily_metrics",
            Category::Sleep => "sleep",
            Category::BodyComposition => "body_composition",
            Category::Activities => "activities",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One record that failed to normalize or store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    /// Date key or activity id
    pub identity: String,
    pub message: String,
}

/// Result of importing one category from one or more files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryOutcome {
    pub imported: u32,
    /// Records with nothing for this category
    pub skipped: u32,
    pub errors: Vec<RecordError>,
}

impl CategoryOutcome {
    pub fn error_count(&self) -> u32 {
        self.errors.len() as u32
    }

    pub fn merge(&mut self, other: CategoryOutcome) {
        self.imported += other.imported;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
    }
}

/// Run-wide counters keyed by category
#[derive(Debug, Clone, Default)]
pub struct ImportStats {
    /// Files read, daily and activity bundles together
    pub files: u32,
    categories: BTreeMap<Category, CategoryOutcome>,
}

impl ImportStats {
    pub fn record(&mut self, category: Category, outcome: CategoryOutcome) {
        self.categories.entry(category).or_default().merge(outcome);
    }

    pub fn get(&self, category: Category) -> CategoryOutcome {
        self.categories.get(&category).cloned().unwrap_or_default()
    }

    pub fn imported(&self, category: Category) -> u32 {
        self.categories.get(&category).map_or(0, |o| o.imported)
    }

    pub fn errors(&self, category: Category) -> u32 {
        self.categories.get(&category).map_or(0, |o| o.error_count())
    }

    pub fn total_imported(&self) -> u32 {
        self.categories.values().map(|o| o.imported).sum()
    }

    pub fn total_errors(&self) -> u32 {
        self.categories.values().map(|o| o.error_count()).sum()
    }
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Imported from {} file(s):", self.files)?;
        for category in Category::ALL {
            let outcome = self.get(category);
            write!(f, "  {:<18} {:>8}", category.name(), outcome.imported)?;
            if outcome.error_count() > 0 {
                write!(f, "  ({} failed)", outcome.error_count())?;
            }
            writeln!(f)?;
        }
        write!(f, "  {:<18} {:>8}", "total", self.total_imported())?;
        if self.total_errors() > 0 {
            write!(f, "  ({} failed)", self.total_errors())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(imported: u32, errors: usize) -> CategoryOutcome {
        CategoryOutcome {
            imported,
            skipped: 0,
            errors: (0..errors)
                .map(|i| RecordError {
                    identity: format!("r{}", i),
                    message: "bad".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_stats_accumulate_across_files() {
        let mut stats = ImportStats::default();
        stats.record(Category::Sleep, outcome(3, 0));
        stats.record(Category::Sleep, outcome(2, 1));
        stats.record(Category::Activities, outcome(4, 0));

        assert_eq!(stats.imported(Category::Sleep), 5);
        assert_eq!(stats.errors(Category::Sleep), 1);
        assert_eq!(stats.total_imported(), 9);
        assert_eq!(stats.imported(Category::Profile), 0);
    }

    #[test]
    fn test_summary_lists_every_category_and_total() {
        let mut stats = ImportStats::default();
        stats.files = 2;
        stats.record(Category::DailyMetrics, outcome(7, 2));

        let text = stats.to_string();
        for category in Category::ALL {
            assert!(text.contains(category.name()));
        }
        assert!(text.contains("(2 failed)"));
        assert!(text.lines().last().unwrap().contains("total"));
    }
}
