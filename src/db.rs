// SQLite persistence for the transformed tables.
//
// Activities, environment readings, and staff shifts are append-only;
// daily_summary rows are keyed by date and replaced on re-runs so the
// summary always reflects the latest pipeline pass.

use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::records::{ActivityRecord, DailySummary, EnvironmentReading, StaffShift};
use crate::transform::TransformedData;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS activities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            pet_id TEXT NOT NULL,
            pet_name TEXT NOT NULL,
            activity_type TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            duration_minutes REAL NOT NULL,
            staff_id TEXT NOT NULL,
            notes TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS environment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            kennel_section TEXT NOT NULL,
            temperature_f REAL NOT NULL,
            humidity_percent REAL NOT NULL,
            noise_level_db REAL NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS staff_shifts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            staff_id TEXT NOT NULL,
            staff_name TEXT NOT NULL,
            shift_start TEXT NOT NULL,
            shift_end TEXT NOT NULL,
            tasks_completed INTEGER NOT NULL
        )",
        [],
    )?;

    // One row per calendar date, replaced on re-runs.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS daily_summary (
            date TEXT PRIMARY KEY,
            total_activities INTEGER NOT NULL,
            total_activity_minutes REAL NOT NULL,
            unique_pets INTEGER NOT NULL,
            avg_temperature REAL,
            avg_humidity REAL,
            avg_noise REAL,
            staff_shifts INTEGER NOT NULL,
            total_tasks INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_activities_timestamp ON activities(timestamp)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_environment_timestamp ON environment(timestamp)",
        [],
    )?;

    Ok(())
}

fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn insert_activities(conn: &Connection, activities: &[ActivityRecord]) -> Result<usize> {
    let mut inserted = 0;
    for record in activities {
        conn.execute(
            "INSERT INTO activities (
                pet_id, pet_name, activity_type, timestamp, duration_minutes, staff_id, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.pet_id,
                record.pet_name,
                record.activity_type.as_str(),
                format_ts(record.timestamp),
                record.duration_minutes,
                record.staff_id,
                record.notes,
            ],
        )?;
        inserted += 1;
    }
    Ok(inserted)
}

pub fn insert_environment(conn: &Connection, readings: &[EnvironmentReading]) -> Result<usize> {
    let mut inserted = 0;
    for reading in readings {
        conn.execute(
            "INSERT INTO environment (
                timestamp, kennel_section, temperature_f, humidity_percent, noise_level_db
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                format_ts(reading.timestamp),
                reading.kennel_section,
                reading.temperature_f,
                reading.humidity_percent,
                reading.noise_level_db,
            ],
        )?;
        inserted += 1;
    }
    Ok(inserted)
}

pub fn insert_staff_shifts(conn: &Connection, shifts: &[StaffShift]) -> Result<usize> {
    let mut inserted = 0;
    for shift in shifts {
        conn.execute(
            "INSERT INTO staff_shifts (
                staff_id, staff_name, shift_start, shift_end, tasks_completed
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                shift.staff_id,
                shift.staff_name,
                format_ts(shift.shift_start),
                format_ts(shift.shift_end),
                shift.tasks_completed,
            ],
        )?;
        inserted += 1;
    }
    Ok(inserted)
}

pub fn upsert_daily_summary(conn: &Connection, summaries: &[DailySummary]) -> Result<usize> {
    let mut written = 0;
    for summary in summaries {
        conn.execute(
            "INSERT OR REPLACE INTO daily_summary (
                date, total_activities, total_activity_minutes, unique_pets,
                avg_temperature, avg_humidity, avg_noise, staff_shifts, total_tasks
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                summary.date.format("%Y-%m-%d").to_string(),
                summary.total_activities,
                summary.total_activity_minutes,
                summary.unique_pets,
                summary.avg_temperature,
                summary.avg_humidity,
                summary.avg_noise,
                summary.staff_shifts,
                summary.total_tasks,
            ],
        )?;
        written += 1;
    }
    Ok(written)
}

/// Persist all four transformed tables in one pass.
pub fn save_transformed(conn: &Connection, data: &TransformedData) -> Result<()> {
    insert_activities(conn, &data.activities)?;
    insert_environment(conn, &data.environment)?;
    insert_staff_shifts(conn, &data.staff)?;
    upsert_daily_summary(conn, &data.daily_summary)?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
