//! Export bundle documents written by the Garmin exporter
//!
//! A daily bundle maps calendar dates to optional per-category sub-sections;
//! an activity bundle wraps a list of activity summaries. Sub-sections stay
//! loosely typed (`serde_json::Value`) until a normalizer reads them.

use std::path::Path;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{ImportError, Result};

/// Metadata header of a daily bundle
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BundleMetadata {
    #[serde(default, deserialize_with = "lenient")]
    pub start_date: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub end_date: Option<String>,

    /// When the exporter generated the file
    #[serde(default, deserialize_with = "lenient")]
    pub extraction_date: Option<String>,

    /// Category names the exporter was asked for
    #[serde(default, deserialize_with = "lenient")]
    pub data_types: Vec<String>,
}

/// One `garmin_daily_<start>_<end>.json` file
#[derive(Debug, Clone, Deserialize)]
pub struct DailyBundle {
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: BundleMetadata,

    /// Date key to day object, in file order
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl DailyBundle {
    pub fn from_json(path: &Path, text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| ImportError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Date entries in file order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A day's bundle with each category resolved to an explicit optional section
#[derive(Debug, Clone, Default)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub stats: Option<Value>,
    pub heart_rate: Option<Value>,
    pub hydration: Option<Value>,
    pub sleep: Option<Value>,
    pub body_composition: Option<Value>,
    pub user_profile: Option<Value>,
}

impl DayRecord {
    /// Resolve one `data` entry
    ///
    /// Fails only when the key is not a `YYYY-MM-DD` date or the value is
    /// not an object.
    pub fn from_entry(key: &str, value: &Value) -> Result<Self> {
        let date = NaiveDate::parse_from_str(key, "%Y-%m-%d")
            .map_err(|_| ImportError::invalid_record(format!("invalid date key '{}'", key)))?;

        let obj = value.as_object().ok_or_else(|| {
            ImportError::invalid_record(format!("day {} is not an object", key))
        })?;

        Ok(Self {
            date,
            stats: section(obj, "stats"),
            heart_rate: section(obj, "heart_rate"),
            hydration: section(obj, "hydration"),
            sleep: section(obj, "sleep"),
            body_composition: section(obj, "body_composition"),
            user_profile: section(obj, "user_profile"),
        })
    }
}

/// Look up a sub-section, treating `null` and exporter error markers as absent
fn section(obj: &Map<String, Value>, name: &str) -> Option<Value> {
    match obj.get(name)? {
        Value::Null => None,
        Value::Object(inner) if inner.contains_key("error") => {
            let error = inner.get("error").map(Value::to_string).unwrap_or_default();
            tracing::debug!(
                section = name,
                error = %error,
                "skipping sub-section the exporter failed to fetch"
            );
            None
        }
        other => Some(other.clone()),
    }
}

/// Metadata header of an activity bundle
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityBundleMetadata {
    #[serde(default, deserialize_with = "lenient")]
    pub extraction_date: Option<String>,

    /// Count the exporter claims; informational only
    #[serde(default, deserialize_with = "lenient")]
    pub activity_count: Option<u64>,
}

/// One `garmin_activities_<date>.json` file
///
/// Entries stay untyped so a malformed one fails as a single record.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityBundle {
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: ActivityBundleMetadata,

    /// `{"summary": {..}, "details": ..}` wrappers
    #[serde(default)]
    pub activities: Vec<Value>,
}

impl ActivityBundle {
    pub fn from_json(path: &Path, text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| ImportError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Summary object of one wrapper
    pub fn summary(entry: &Value) -> Result<&Value> {
        match entry {
            Value::Object(wrapper) => wrapper
                .get("summary")
                .filter(|s| s.is_object())
                .ok_or_else(|| ImportError::invalid_record("activity has no summary object")),
            _ => Err(ImportError::invalid_record("activity entry is not an object")),
        }
    }

    /// Identity used in logs for the activity at `index`
    pub fn identity(&self, index: usize) -> String {
        self.activities
            .get(index)
            .and_then(|w| w.get("summary"))
            .and_then(|s| s.get("activityId"))
            .map(|id| id.to_string())
            .unwrap_or_else(|| format!("#{}", index))
    }
}

/// Metadata is only logged, so a field of the wrong type reads as absent
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_daily_bundle_keeps_file_order() {
        let text = r#"{
            "metadata": {"start_date": "2024-01-01", "end_date": "2024-01-03", "data_types": ["stats"]},
            "data": {
                "2024-01-03": {},
                "2024-01-01": {},
                "2024-01-02": {}
            }
        }"#;
        let bundle = DailyBundle::from_json(Path::new("x.json"), text).unwrap();
        let keys: Vec<&str> = bundle.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["2024-01-03", "2024-01-01", "2024-01-02"]);
        assert_eq!(bundle.metadata.data_types, vec!["stats".to_string()]);
    }

    #[test]
    fn test_daily_bundle_parse_error_names_file() {
        let err = DailyBundle::from_json(Path::new("broken.json"), "{not json").unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_day_record_resolves_sections() {
        let value = json!({
            "stats": {"totalSteps": 1000},
            "sleep": null,
            "hydration": {"error": "HTTP 500"},
            "stress": {"avgStressLevel": 20}
        });
        let day = DayRecord::from_entry("2024-01-01", &value).unwrap();
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(day.stats.is_some());
        assert!(day.sleep.is_none());
        assert!(day.hydration.is_none());
        assert!(day.heart_rate.is_none());
    }

    #[test]
    fn test_day_record_rejects_non_object() {
        let err = DayRecord::from_entry("2024-01-01", &json!([1, 2])).unwrap_err();
        assert!(matches!(err, ImportError::InvalidRecord(_)));
    }

    #[test]
    fn test_day_record_rejects_bad_date_key() {
        let err = DayRecord::from_entry("yesterday", &json!({})).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn test_activity_bundle_identity() {
        let text = r#"{
            "metadata": {"extraction_date": "2024-01-03T10:00:00", "activity_count": 5},
            "activities": [
                {"summary": {"activityId": 42}, "details": null},
                {"summary": {}}
            ]
        }"#;
        let bundle = ActivityBundle::from_json(Path::new("a.json"), text).unwrap();
        assert_eq!(bundle.metadata.activity_count, Some(5));
        assert_eq!(bundle.activities.len(), 2);
        assert_eq!(bundle.identity(0), "42");
        assert_eq!(bundle.identity(1), "#1");
    }

    #[test]
    fn test_activity_summary_requires_object_wrapper() {
        let wrapper = json!({"summary": {"activityId": 1}, "details": null});
        assert_eq!(
            ActivityBundle::summary(&wrapper).unwrap(),
            &json!({"activityId": 1})
        );

        for entry in [json!(null), json!("x"), json!({"details": {}}), json!({"summary": 3})] {
            let err = ActivityBundle::summary(&entry).unwrap_err();
            assert!(matches!(err, ImportError::InvalidRecord(_)), "{}", entry);
        }
    }

    #[test]
    fn test_mistyped_metadata_reads_as_absent() {
        let text = r#"{"metadata": {"data_types": null, "end_date": 5}, "data": {}}"#;
        let bundle = DailyBundle::from_json(Path::new("d.json"), text).unwrap();
        assert!(bundle.metadata.data_types.is_empty());
        assert_eq!(bundle.metadata.end_date, None);

        for count in ["-1", "3.5", "\"many\""] {
            let text = format!(r#"{{"metadata": {{"activity_count": {}}}, "activities": []}}"#, count);
            let bundle = ActivityBundle::from_json(Path::new("a.json"), &text).unwrap();
            assert_eq!(bundle.metadata.activity_count, None, "{}", count);
        }

        let bundle = ActivityBundle::from_json(Path::new("a.json"), r#"{"metadata": null}"#).unwrap();
        assert!(bundle.activities.is_empty());
    }
}
