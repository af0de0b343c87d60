//! Database models matching schema tables

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;

use crate::db::schema::Relation;
use crate::storage::{MergeRule, UpsertRow};

use crate::storage::MergeRule::{KeepExistingWhenNull, Overwrite};

fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}

fn datetime_value(dt: Option<NaiveDateTime>) -> Value {
    dt.map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()).into()
}

/// Owner of every imported row
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl UpsertRow for UserProfile {
    const RELATION: Relation = Relation::Users;
    const KEY_COLUMNS: &'static [&'static str] = &["user_id"];
    const UPDATE_COLUMNS: &'static [(&'static str, MergeRule)] = &[
        ("display_name", Overwrite),
        ("full_name", KeepExistingWhenNull),
        ("email", KeepExistingWhenNull),
    ];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", self.user_id.clone().into()),
            ("display_name", self.display_name.clone().into()),
            ("full_name", self.full_name.clone().into()),
            ("email", self.email.clone().into()),
        ]
    }

    fn natural_key(&self) -> String {
        self.user_id.clone()
    }
}

/// One calendar day of wellness totals
#[derive(Debug, Clone, PartialEq)]
pub struct DailyHealthMetric {
    pub metric_date: NaiveDate,
    pub user_id: String,
    pub total_steps: Option<i64>,
    pub total_distance_meters: Option<f64>,
    pub active_calories: Option<i64>,
    pub resting_calories: Option<i64>,
    pub total_calories: Option<i64>,
    pub resting_heart_rate: Option<i64>,
    pub min_heart_rate: Option<i64>,
    pub max_heart_rate: Option<i64>,
    pub hydration_goal_ml: Option<i64>,
    pub hydration_intake_ml: Option<i64>,
}

impl UpsertRow for DailyHealthMetric {
    const RELATION: Relation = Relation::DailyHealthMetrics;
    const KEY_COLUMNS: &'static [&'static str] = &["metric_date", "user_id"];
    const UPDATE_COLUMNS: &'static [(&'static str, MergeRule)] = &[
        ("total_steps", Overwrite),
        ("total_distance_meters", Overwrite),
        ("active_calories", Overwrite),
        ("resting_calories", Overwrite),
        ("total_calories", Overwrite),
        ("resting_heart_rate", Overwrite),
        ("min_heart_rate", Overwrite),
        ("max_heart_rate", Overwrite),
        ("hydration_goal_ml", Overwrite),
        ("hydration_intake_ml", Overwrite),
    ];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("metric_date", date_value(self.metric_date)),
            ("user_id", self.user_id.clone().into()),
            ("total_steps", self.total_steps.into()),
            ("total_distance_meters", self.total_distance_meters.into()),
            ("active_calories", self.active_calories.into()),
            ("resting_calories", self.resting_calories.into()),
            ("total_calories", self.total_calories.into()),
            ("resting_heart_rate", self.resting_heart_rate.into()),
            ("min_heart_rate", self.min_heart_rate.into()),
            ("max_heart_rate", self.max_heart_rate.into()),
            ("hydration_goal_ml", self.hydration_goal_ml.into()),
            ("hydration_intake_ml", self.hydration_intake_ml.into()),
        ]
    }

    fn natural_key(&self) -> String {
        format!("({}, {})", self.metric_date, self.user_id)
    }
}

/// One night of sleep, attributed to the date it ends on
#[derive(Debug, Clone, PartialEq)]
pub struct SleepSession {
    pub user_id: String,
    pub sleep_date: NaiveDate,
    pub sleep_time_seconds: Option<i64>,
    pub deep_sleep_seconds: Option<i64>,
    pub light_sleep_seconds: Option<i64>,
    pub rem_sleep_seconds: Option<i64>,
    pub awake_sleep_seconds: Option<i64>,
    pub sleep_start_local: Option<NaiveDateTime>,
    pub sleep_end_local: Option<NaiveDateTime>,
    pub sleep_score: Option<i64>,
}

impl UpsertRow for SleepSession {
    const RELATION: Relation = Relation::SleepSessions;
    const KEY_COLUMNS: &'static [&'static str] = &["user_id", "sleep_date"];
    const UPDATE_COLUMNS: &'static [(&'static str, MergeRule)] = &[
        ("sleep_time_seconds", Overwrite),
        ("deep_sleep_seconds", Overwrite),
        ("light_sleep_seconds", Overwrite),
        ("rem_sleep_seconds", Overwrite),
        ("awake_sleep_seconds", Overwrite),
        ("sleep_start_local", Overwrite),
        ("sleep_end_local", Overwrite),
        ("sleep_score", Overwrite),
    ];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", self.user_id.clone().into()),
            ("sleep_date", date_value(self.sleep_date)),
            ("sleep_time_seconds", self.sleep_time_seconds.into()),
            ("deep_sleep_seconds", self.deep_sleep_seconds.into()),
            ("light_sleep_seconds", self.light_sleep_seconds.into()),
            ("rem_sleep_seconds", self.rem_sleep_seconds.into()),
            ("awake_sleep_seconds", self.awake_sleep_seconds.into()),
            ("sleep_start_local", datetime_value(self.sleep_start_local)),
            ("sleep_end_local", datetime_value(self.sleep_end_local)),
            ("sleep_score", self.sleep_score.into()),
        ]
    }

    fn natural_key(&self) -> String {
        format!("({}, {})", self.user_id, self.sleep_date)
    }
}

/// Daily average of scale measurements
#[derive(Debug, Clone, PartialEq)]
pub struct BodyComposition {
    pub measurement_date: NaiveDate,
    pub user_id: String,
    pub weight_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub muscle_mass_kg: Option<f64>,
    pub bone_mass_kg: Option<f64>,
    pub bmi: Option<f64>,
}

impl UpsertRow for BodyComposition {
    const RELATION: Relation = Relation::BodyComposition;
    const KEY_COLUMNS: &'static [&'static str] = &["measurement_date", "user_id"];
    const UPDATE_COLUMNS: &'static [(&'static str, MergeRule)] = &[
        ("weight_kg", Overwrite),
        ("body_fat_pct", Overwrite),
        ("muscle_mass_kg", Overwrite),
        ("bone_mass_kg", Overwrite),
        ("bmi", Overwrite),
    ];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("measurement_date", date_value(self.measurement_date)),
            ("user_id", self.user_id.clone().into()),
            ("weight_kg", self.weight_kg.into()),
            ("body_fat_pct", self.body_fat_pct.into()),
            ("muscle_mass_kg", self.muscle_mass_kg.into()),
            ("bone_mass_kg", self.bone_mass_kg.into()),
            ("bmi", self.bmi.into()),
        ]
    }

    fn natural_key(&self) -> String {
        format!("({}, {})", self.measurement_date, self.user_id)
    }
}

/// Activity summary from an activity bundle
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub activity_id: i64,
    pub user_id: String,
    pub activity_name: Option<String>,
    pub activity_type: Option<String>,
    pub start_time_local: Option<NaiveDateTime>,
    pub start_time_gmt: Option<NaiveDateTime>,
    pub duration_seconds: Option<i64>,
    pub distance_meters: Option<f64>,
    pub calories: Option<i64>,
    pub bmr_calories: Option<i64>,
    pub active_calories: Option<i64>,
    pub average_hr: Option<i64>,
    pub max_hr: Option<i64>,
    pub average_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub elevation_gain: Option<f64>,
    pub elevation_loss: Option<f64>,
    pub start_latitude: Option<f64>,
    pub start_longitude: Option<f64>,
    pub has_polyline: bool,
}

impl UpsertRow for Activity {
    const RELATION: Relation = Relation::Activities;
    const KEY_COLUMNS: &'static [&'static str] = &["activity_id"];
    // Coordinates, polyline flag and owner are fixed at first sight
    const UPDATE_COLUMNS: &'static [(&'static str, MergeRule)] = &[
        ("activity_name", Overwrite),
        ("activity_type", Overwrite),
        ("start_time_local", Overwrite),
        ("start_time_gmt", Overwrite),
        ("duration_seconds", Overwrite),
        ("distance_meters", Overwrite),
        ("calories", Overwrite),
        ("bmr_calories", Overwrite),
        ("active_calories", Overwrite),
        ("average_hr", Overwrite),
        ("max_hr", Overwrite),
        ("average_speed", Overwrite),
        ("max_speed", Overwrite),
        ("elevation_gain", Overwrite),
        ("elevation_loss", Overwrite),
    ];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("activity_id", self.activity_id.into()),
            ("user_id", self.user_id.clone().into()),
            ("activity_name", self.activity_name.clone().into()),
            ("activity_type", self.activity_type.clone().into()),
            ("start_time_local", datetime_value(self.start_time_local)),
            ("start_time_gmt", datetime_value(self.start_time_gmt)),
            ("duration_seconds", self.duration_seconds.into()),
            ("distance_meters", self.distance_meters.into()),
            ("calories", self.calories.into()),
            ("bmr_calories", self.bmr_calories.into()),
            ("active_calories", self.active_calories.into()),
            ("average_hr", self.average_hr.into()),
            ("max_hr", self.max_hr.into()),
            ("average_speed", self.average_speed.into()),
            ("max_speed", self.max_speed.into()),
            ("elevation_gain", self.elevation_gain.into()),
            ("elevation_loss", self.elevation_loss.into()),
            ("start_latitude", self.start_latitude.into()),
            ("start_longitude", self.start_longitude.into()),
            ("has_polyline", self.has_polyline.into()),
        ]
    }

    fn natural_key(&self) -> String {
        self.activity_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{upsert_statement, Database};

    fn activity(name: &str, lat: Option<f64>, has_polyline: bool) -> Activity {
        Activity {
            activity_id: 17,
            user_id: "u1".to_string(),
            activity_name: Some(name.to_string()),
            activity_type: Some("running".to_string()),
            start_time_local: NaiveDate::from_ymd_opt(2024, 1, 3)
                .unwrap()
                .and_hms_opt(7, 0, 0),
            start_time_gmt: None,
            duration_seconds: Some(1800),
            distance_meters: Some(5000.0),
            calories: Some(400),
            bmr_calories: Some(40),
            active_calories: Some(360),
            average_hr: Some(150),
            max_hr: Some(175),
            average_speed: Some(2.7),
            max_speed: Some(3.4),
            elevation_gain: Some(20.0),
            elevation_loss: Some(19.0),
            start_latitude: lat,
            start_longitude: lat.map(|l| l / 10.0),
            has_polyline,
        }
    }

    #[test]
    fn test_every_model_builds_a_valid_statement() {
        fn check<R: UpsertRow>(row: &R) {
            let names: Vec<&str> = row.columns().into_iter().map(|(n, _)| n).collect();
            upsert_statement::<R>(&names).expect("statement should build");
        }

        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        check(&UserProfile {
            user_id: "u1".into(),
            display_name: None,
            full_name: None,
            email: None,
        });
        check(&DailyHealthMetric {
            metric_date: date,
            user_id: "u1".into(),
            total_steps: None,
            total_distance_meters: None,
            active_calories: None,
            resting_calories: None,
            total_calories: None,
            resting_heart_rate: None,
            min_heart_rate: None,
            max_heart_rate: None,
            hydration_goal_ml: None,
            hydration_intake_ml: None,
        });
        check(&SleepSession {
            user_id: "u1".into(),
            sleep_date: date,
            sleep_time_seconds: None,
            deep_sleep_seconds: None,
            light_sleep_seconds: None,
            rem_sleep_seconds: None,
            awake_sleep_seconds: None,
            sleep_start_local: None,
            sleep_end_local: None,
            sleep_score: None,
        });
        check(&BodyComposition {
            measurement_date: date,
            user_id: "u1".into(),
            weight_kg: None,
            body_fat_pct: None,
            muscle_mass_kg: None,
            bone_mass_kg: None,
            bmi: None,
        });
        check(&activity("Run", None, false));
    }

    #[test]
    fn test_activity_reimport_keeps_insert_only_columns() {
        let db = Database::connect_in_memory().unwrap();
        db.upsert(&activity("Morning Run", Some(40.4), true)).unwrap();
        db.upsert(&activity("Renamed Run", None, false)).unwrap();

        let (name, lat, polyline, start): (String, Option<f64>, bool, String) = db
            .query_row(
                "SELECT activity_name, start_latitude, has_polyline, start_time_local
                 FROM activities WHERE activity_id = 17",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();

        assert_eq!(name, "Renamed Run");
        assert_eq!(lat, Some(40.4));
        assert!(polyline);
        assert_eq!(start, "2024-01-03 07:00:00");
    }

    #[test]
    fn test_profile_refresh_keeps_email() {
        let db = Database::connect_in_memory().unwrap();
        db.upsert(&UserProfile {
            user_id: "u1".into(),
            display_name: Some("runner".into()),
            full_name: Some("Ann Runner".into()),
            email: Some("ann@example.com".into()),
        })
        .unwrap();
        db.upsert(&UserProfile {
            user_id: "u1".into(),
            display_name: Some("runner2".into()),
            full_name: None,
            email: None,
        })
        .unwrap();

        let (display, email): (Option<String>, Option<String>) = db
            .query_row(
                "SELECT display_name, email FROM users WHERE user_id = 'u1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(display.as_deref(), Some("runner2"));
        assert_eq!(email.as_deref(), Some("ann@example.com"));
    }
}
