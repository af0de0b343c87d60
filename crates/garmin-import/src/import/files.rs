//! Export file discovery and the all / only-latest selection policy
//!
//! Bundle names embed their dates (`garmin_daily_2024-01-01_2024-01-07.json`),
//! so lexicographic order is chronological order.

use std::path::{Path, PathBuf};

use crate::config::SourceSelection;

/// Name convention for one bundle kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilePattern {
    pub prefix: &'static str,
    pub suffix: &'static str,
}

impl FilePattern {
    pub const DAILY: FilePattern = FilePattern {
        prefix: "garmin_daily_",
        suffix: ".json",
    };

    pub const ACTIVITIES: FilePattern = FilePattern {
        prefix: "garmin_activities_",
        suffix: ".json",
    };

    pub fn matches(&self, name: &str) -> bool {
        name.len() > self.prefix.len() + self.suffix.len()
            && name.starts_with(self.prefix)
            && name.ends_with(self.suffix)
    }
}

/// Which of the matching files to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    OnlyLatest,
}

impl From<&SourceSelection> for Selection {
    fn from(source: &SourceSelection) -> Self {
        if source.only_latest {
            Selection::OnlyLatest
        } else {
            Selection::All
        }
    }
}

/// Resolve the files to import for one bundle kind
///
/// Explicit files win over scanning and are returned as given; whether they
/// exist is the reader's concern. No match is an empty list, not an error.
pub fn select_files(
    dir: &Path,
    pattern: FilePattern,
    selection: Selection,
    explicit: &[PathBuf],
) -> Vec<PathBuf> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }

    let mut files = scan_dir(dir, pattern);
    files.sort();

    match selection {
        Selection::All => files,
        Selection::OnlyLatest => files.pop().into_iter().collect(),
    }
}

fn scan_dir(dir: &Path, pattern: FilePattern) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot read export directory");
            return Vec::new();
        }
    };

    let files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| pattern.matches(name))
                .unwrap_or(false)
        })
        .map(|entry| entry.path())
        .collect();

    tracing::debug!(
        dir = %dir.display(),
        prefix = pattern.prefix,
        matched = files.len(),
        "scanned export directory"
    );

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const A: FilePattern = FilePattern {
        prefix: "a_",
        suffix: ".json",
    };

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "{}").unwrap();
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a_20240103.json");
        touch(temp.path(), "a_20240101.json");
        touch(temp.path(), "a_20240102.json");
        touch(temp.path(), "a_20240104.txt");
        touch(temp.path(), "b_20240105.json");
        std::fs::create_dir(temp.path().join("a_20240106.json")).unwrap();
        temp
    }

    #[test]
    fn test_all_returns_sorted_matches() {
        let temp = fixture();
        let files = select_files(temp.path(), A, Selection::All, &[]);
        assert_eq!(
            names(&files),
            vec!["a_20240101.json", "a_20240102.json", "a_20240103.json"]
        );
    }

    #[test]
    fn test_only_latest_returns_last() {
        let temp = fixture();
        let files = select_files(temp.path(), A, Selection::OnlyLatest, &[]);
        assert_eq!(names(&files), vec!["a_20240103.json"]);
    }

    #[test]
    fn test_explicit_files_take_precedence() {
        let temp = fixture();
        let explicit = vec![PathBuf::from("/nowhere/x.json"), PathBuf::from("y.json")];
        let files = select_files(temp.path(), A, Selection::OnlyLatest, &explicit);
        assert_eq!(files, explicit);
    }

    #[test]
    fn test_no_matches_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(select_files(temp.path(), A, Selection::All, &[]).is_empty());
        assert!(select_files(temp.path(), A, Selection::OnlyLatest, &[]).is_empty());
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");
        assert!(select_files(&missing, A, Selection::All, &[]).is_empty());
    }

    #[test]
    fn test_default_patterns() {
        assert!(FilePattern::DAILY.matches("garmin_daily_2024-01-01_2024-01-07.json"));
        assert!(!FilePattern::DAILY.matches("garmin_activities_2024-01-07.json"));
        assert!(FilePattern::ACTIVITIES.matches("garmin_activities_2024-01-07.json"));
        assert!(!FilePattern::ACTIVITIES.matches("garmin_activities_.json"));
    }

    #[test]
    fn test_selection_from_source() {
        let source = SourceSelection {
            files: vec![],
            only_latest: true,
        };
        assert_eq!(Selection::from(&source), Selection::OnlyLatest);
        assert_eq!(Selection::from(&SourceSelection::default()), Selection::All);
    }
}
