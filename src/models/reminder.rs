use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::ReminderStatus;

/// Storage format for scheduled timestamps (second resolution).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage format for bare dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single scheduled dose occurrence of a medicine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub reminder_id: i64,
    pub medicine_id: i64,
    pub remind_at: NaiveDateTime,
    pub status: ReminderStatus,
}

/// Parse a stored `remind_at` value.
pub fn parse_remind_at(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
}

/// Format a timestamp for storage.
pub fn format_remind_at(ts: &NaiveDateTime) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}
