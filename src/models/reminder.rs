//! Medication reminder model
//!
//! A reminder fires once, at the first scheduler check whose local `HH:MM`
//! equals `scheduled_time`.

use chrono::NaiveTime;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{DbError, DbResult};

/// Reminder validation and storage errors
#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Invalid reminder time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Pill name cannot be empty")]
    EmptyPillName,

    #[error("Phone number cannot be empty")]
    EmptyPhoneNumber,
}

/// A pending (or sent) medication reminder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderEntry {
    pub id: i64,
    pub pill_name: String,
    /// Zero-padded local time, "HH:MM"
    pub scheduled_time: String,
    pub phone_number: String,
    pub sent: bool,
}

/// Validated data for a new reminder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderCreate {
    pub pill_name: String,
    pub scheduled_time: String,
    pub phone_number: String,
}

impl ReminderCreate {
    /// Validate and normalise user input
    pub fn new(
        pill_name: &str,
        time: &str,
        phone_number: &str,
        default_country_code: &str,
    ) -> Result<Self, ReminderError> {
        let pill_name = pill_name.trim();
        if pill_name.is_empty() {
            return Err(ReminderError::EmptyPillName);
        }

        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(ReminderError::EmptyPhoneNumber);
        }

        Ok(Self {
            pill_name: pill_name.to_string(),
            scheduled_time: normalize_time(time)?,
            phone_number: format_phone_number(phone_number, default_country_code),
        })
    }
}

/// Parse "H:MM" / "HH:MM" (optionally with seconds) into zero-padded "HH:MM"
pub fn normalize_time(raw: &str) -> Result<String, ReminderError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| ReminderError::InvalidTime(raw.to_string()))
}

/// Format a time as the scheduler compares it
pub fn minute_key(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Prefix `default_country_code` unless the number already carries one
pub fn format_phone_number(number: &str, default_country_code: &str) -> String {
    let number = number.trim();
    if number.starts_with('+') {
        number.to_string()
    } else {
        format!("{}{}", default_country_code, number)
    }
}

impl ReminderEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            pill_name: row.get("pill_name")?,
            scheduled_time: row.get("scheduled_time")?,
            phone_number: row.get("phone_number")?,
            sent: row.get("sent")?,
        })
    }

    pub fn create(conn: &Connection, data: &ReminderCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO reminders (pill_name, scheduled_time, phone_number)
            VALUES (?1, ?2, ?3)
            "#,
            params![data.pill_name, data.scheduled_time, data.phone_number],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM reminders WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(reminder) => Ok(Some(reminder)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All reminders in insertion order
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM reminders ORDER BY id")?;
        let reminders = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(reminders)
    }

    pub fn mark_sent(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "UPDATE reminders SET sent = 1, updated_at = datetime('now') WHERE id = ?1",
            [id],
        )?;
        Ok(rows > 0)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM reminders WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
