//! Record normalization: loosely-typed export sections to typed rows
//!
//! Absent, `null` and sentinel values become `None` rather than a made-up
//! number. Only a record without its identity is an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::db::models::{Activity, BodyComposition, DailyHealthMetric, SleepSession, UserProfile};
use crate::error::{ImportError, Result};
use crate::models::DayRecord;

/// Outcome of normalizing one record for one category
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized<T> {
    Row(T),
    /// The record has nothing for this category
    Skip,
}

impl<T> Normalized<T> {
    pub fn row(self) -> Option<T> {
        match self {
            Normalized::Row(row) => Some(row),
            Normalized::Skip => None,
        }
    }
}

/// Profile carried by a day, if it names the user in any way
pub fn normalize_profile(user_id: &str, day: &DayRecord) -> Normalized<UserProfile> {
    let Some(profile) = day.user_profile.as_ref() else {
        return Normalized::Skip;
    };

    let display_name = text(profile.get("displayName")).or_else(|| text(profile.get("userName")));
    let full_name = text(profile.get("fullName"));
    let email = text(profile.get("email")).or_else(|| text(profile.get("emailAddress")));

    if display_name.is_none() && full_name.is_none() && email.is_none() {
        return Normalized::Skip;
    }

    Normalized::Row(UserProfile {
        user_id: user_id.to_string(),
        display_name,
        full_name,
        email,
    })
}

/// Daily totals; needs the `stats` section
pub fn normalize_daily(user_id: &str, day: &DayRecord) -> Normalized<DailyHealthMetric> {
    let Some(stats) = day.stats.as_ref() else {
        return Normalized::Skip;
    };
    let heart_rate = day.heart_rate.as_ref();
    let hydration = day.hydration.as_ref();

    Normalized::Row(DailyHealthMetric {
        metric_date: day.date,
        user_id: user_id.to_string(),
        total_steps: int(stats.get("totalSteps")),
        total_distance_meters: float(stats.get("totalDistanceMeters")),
        active_calories: int(stats.get("activeKilocalories")),
        resting_calories: int(stats.get("bmrKilocalories")),
        total_calories: int(stats.get("totalKilocalories")),
        resting_heart_rate: positive_int(heart_rate.and_then(|v| v.get("restingHeartRate"))),
        min_heart_rate: positive_int(heart_rate.and_then(|v| v.get("minHeartRate"))),
        max_heart_rate: positive_int(heart_rate.and_then(|v| v.get("maxHeartRate"))),
        hydration_goal_ml: positive_int(hydration.and_then(|v| v.get("goalInML"))),
        hydration_intake_ml: int(hydration.and_then(|v| v.get("valueInML"))),
    })
}

/// Sleep session; needs a sleep DTO with at least one duration
pub fn normalize_sleep(user_id: &str, day: &DayRecord) -> Normalized<SleepSession> {
    let Some(dto) = day
        .sleep
        .as_ref()
        .and_then(|v| v.get("dailySleepDTO"))
        .filter(|v| v.is_object())
    else {
        return Normalized::Skip;
    };

    let deep = int(dto.get("deepSleepSeconds"));
    let light = int(dto.get("lightSleepSeconds"));
    let rem = int(dto.get("remSleepSeconds"));
    let awake = int(dto.get("awakeSleepSeconds"));

    let total = int(dto.get("sleepTimeSeconds")).or_else(|| match (deep, light, rem) {
        (Some(d), Some(l), Some(r)) => Some(d + l + r),
        _ => None,
    });

    if total.is_none() && deep.is_none() && light.is_none() && rem.is_none() {
        return Normalized::Skip;
    }

    let sleep_date = text(dto.get("calendarDate"))
        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
        .unwrap_or(day.date);

    Normalized::Row(SleepSession {
        user_id: user_id.to_string(),
        sleep_date,
        sleep_time_seconds: total,
        deep_sleep_seconds: deep,
        light_sleep_seconds: light,
        rem_sleep_seconds: rem,
        awake_sleep_seconds: awake,
        sleep_start_local: timestamp(dto.get("sleepStartTimestampLocal")),
        sleep_end_local: timestamp(dto.get("sleepEndTimestampLocal")),
        sleep_score: positive_int(path(dto, &["sleepScores", "overall", "value"])),
    })
}

/// Body composition averages; needs a weighed-in `totalAverage`
pub fn normalize_body(user_id: &str, day: &DayRecord) -> Normalized<BodyComposition> {
    let Some(average) = day
        .body_composition
        .as_ref()
        .and_then(|v| v.get("totalAverage"))
        .filter(|v| v.is_object())
    else {
        return Normalized::Skip;
    };

    let Some(weight_kg) = grams_to_kg(average.get("weight")) else {
        return Normalized::Skip;
    };

    Normalized::Row(BodyComposition {
        measurement_date: day.date,
        user_id: user_id.to_string(),
        weight_kg: Some(weight_kg),
        body_fat_pct: positive_float(average.get("bodyFat")),
        muscle_mass_kg: grams_to_kg(average.get("muscleMass")),
        bone_mass_kg: grams_to_kg(average.get("boneMass")),
        bmi: positive_float(average.get("bmi")),
    })
}

/// Activity summary from an activity bundle wrapper
pub fn normalize_activity(user_id: &str, summary: &Value) -> Result<Activity> {
    if !summary.is_object() {
        return Err(ImportError::invalid_record("activity summary is not an object"));
    }

    let activity_id = summary
        .get("activityId")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| ImportError::invalid_record("Missing activityId"))?;

    let calories = int(summary.get("calories"));
    let bmr_calories = int(summary.get("bmrCalories"));
    let active_calories = match (calories, bmr_calories) {
        (Some(total), Some(bmr)) if total >= bmr => Some(total - bmr),
        _ => None,
    };

    // 0/0 is what devices report when they never got a fix
    let (start_latitude, start_longitude) =
        match (float(summary.get("startLatitude")), float(summary.get("startLongitude"))) {
            (Some(lat), Some(lon)) if lat == 0.0 && lon == 0.0 => (None, None),
            coords => coords,
        };

    Ok(Activity {
        activity_id,
        user_id: user_id.to_string(),
        activity_name: text(summary.get("activityName")),
        activity_type: text(path(summary, &["activityType", "typeKey"])),
        start_time_local: timestamp(summary.get("startTimeLocal")),
        start_time_gmt: timestamp(summary.get("startTimeGMT")),
        duration_seconds: int(summary.get("duration")),
        distance_meters: float(summary.get("distance")),
        calories,
        bmr_calories,
        active_calories,
        average_hr: positive_int(summary.get("averageHR")),
        max_hr: positive_int(summary.get("maxHR")),
        average_speed: float(summary.get("averageSpeed")),
        max_speed: float(summary.get("maxSpeed")),
        elevation_gain: float(summary.get("elevationGain")),
        elevation_loss: float(summary.get("elevationLoss")),
        start_latitude,
        start_longitude,
        has_polyline: summary
            .get("hasPolyline")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
    })
}

fn path<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(value, |v, key| v.get(*key))
}

/// Whole number, rounding floats (durations arrive as `1234.0`)
fn int(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    if let Some(int) = value.as_i64() {
        return Some(int);
    }
    value.as_f64().map(|float| float.round() as i64)
}

fn positive_int(value: Option<&Value>) -> Option<i64> {
    int(value).filter(|v| *v > 0)
}

fn float(value: Option<&Value>) -> Option<f64> {
    value?.as_f64()
}

fn positive_float(value: Option<&Value>) -> Option<f64> {
    float(value).filter(|v| *v > 0.0)
}

fn grams_to_kg(value: Option<&Value>) -> Option<f64> {
    positive_float(value).map(|g| g / 1000.0)
}

fn text(value: Option<&Value>) -> Option<String> {
    value?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Local timestamp from a Garmin string or epoch milliseconds
fn timestamp(value: Option<&Value>) -> Option<NaiveDateTime> {
    match value? {
        Value::String(s) => parse_garmin_datetime(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.naive_utc()),
        _ => None,
    }
}

fn parse_garmin_datetime(value: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
}
