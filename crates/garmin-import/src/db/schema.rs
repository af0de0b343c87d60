//! Database schema and migrations

use rusqlite::Connection;

use crate::error::ImportError;

/// Destination relations written by the importer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    Users,
    DailyHealthMetrics,
    SleepSessions,
    BodyComposition,
    Activities,
}

impl Relation {
    pub const ALL: [Relation; 5] = [
        Relation::Users,
        Relation::DailyHealthMetrics,
        Relation::SleepSessions,
        Relation::BodyComposition,
        Relation::Activities,
    ];

    /// Table name in the store
    pub fn table_name(&self) -> &'static str {
        match self {
            Relation::Users => "users",
            Relation::DailyHealthMetrics => "daily_health_metrics",
            Relation::SleepSessions => "sleep_sessions",
            Relation::BodyComposition => "body_composition",
            Relation::Activities => "activities",
        }
    }

    /// Date-like column whose bounds are reported by verification
    pub fn date_column(&self) -> Option<&'static str> {
        match self {
            Relation::Users => None,
            Relation::DailyHealthMetrics => Some("metric_date"),
            Relation::SleepSessions => Some("sleep_date"),
            Relation::BodyComposition => Some("measurement_date"),
            Relation::Activities => Some("start_time_local"),
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Run all pending migrations
pub fn migrate(conn: &Connection) -> crate::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )
    .map_err(|e| ImportError::Database(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| ImportError::Database(format!("Failed to read schema version: {}", e)))?;

    if current_version < 1 {
        migration_v1(conn)?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migration_v1(conn: &Connection) -> crate::Result<()> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            display_name TEXT,
            full_name TEXT,
            email TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        "CREATE TABLE IF NOT EXISTS daily_health_metrics (
            metric_date TEXT NOT NULL,
            user_id TEXT NOT NULL,
            total_steps INTEGER,
            total_distance_meters REAL,
            active_calories INTEGER,
            resting_calories INTEGER,
            total_calories INTEGER,
            resting_heart_rate INTEGER,
            min_heart_rate INTEGER,
            max_heart_rate INTEGER,
            hydration_goal_ml INTEGER,
            hydration_intake_ml INTEGER,
            PRIMARY KEY (metric_date, user_id)
        )",
        "CREATE TABLE IF NOT EXISTS sleep_sessions (
            user_id TEXT NOT NULL,
            sleep_date TEXT NOT NULL,
            sleep_time_seconds INTEGER,
            deep_sleep_seconds INTEGER,
            light_sleep_seconds INTEGER,
            rem_sleep_seconds INTEGER,
            awake_sleep_seconds INTEGER,
            sleep_start_local TEXT,
            sleep_end_local TEXT,
            sleep_score INTEGER,
            PRIMARY KEY (user_id, sleep_date)
        )",
        "CREATE TABLE IF NOT EXISTS body_composition (
            measurement_date TEXT NOT NULL,
            user_id TEXT NOT NULL,
            weight_kg REAL,
            body_fat_pct REAL,
            muscle_mass_kg REAL,
            bone_mass_kg REAL,
            bmi REAL,
            PRIMARY KEY (measurement_date, user_id)
        )",
        "CREATE TABLE IF NOT EXISTS activities (
            activity_id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            activity_name TEXT,
            activity_type TEXT,
            start_time_local TEXT,
            start_time_gmt TEXT,
            duration_seconds INTEGER,
            distance_meters REAL,
            calories INTEGER,
            bmr_calories INTEGER,
            active_calories INTEGER,
            average_hr INTEGER,
            max_hr INTEGER,
            average_speed REAL,
            max_speed REAL,
            elevation_gain REAL,
            elevation_loss REAL,
            start_latitude REAL,
            start_longitude REAL,
            has_polyline INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        "CREATE INDEX IF NOT EXISTS idx_activities_start ON activities(user_id, start_time_local)",
        "INSERT INTO schema_migrations (version) VALUES (1)",
    ];

    for sql in statements {
        conn.execute(sql, []).map_err(|e| {
            ImportError::Database(format!(
                "{}: {}",
                sql.chars().take(50).collect::<String>(),
                e
            ))
        })?;
    }

    Ok(())
}
