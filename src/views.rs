//! Read shapes over the occurrence data — view types and the query
//! functions that build them, plus the display helpers (time-of-day
//! bucket, medication icon) derived from stored fields.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;
use crate::models::reminder::{parse_remind_at, DATE_FORMAT};

// ═══════════════════════════════════════════
// Display helpers
// ═══════════════════════════════════════════

/// Coarse time-of-day bucket for the calendar view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeBucket {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=21 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

/// Ordered keyword → icon rules; first match wins.
const ICON_RULES: &[(&str, &str)] = &[
    ("vitamin", "fa-apple-alt"),
    ("aspirin", "fa-pills"),
    ("pain", "fa-pills"),
    ("blood", "fa-heartbeat"),
    ("pressure", "fa-heartbeat"),
    ("allergy", "fa-wind"),
    ("antibiotic", "fa-bacteria"),
    ("sleep", "fa-moon"),
    ("calcium", "fa-bone"),
    ("bone", "fa-bone"),
];

const DEFAULT_ICON: &str = "fa-capsules";

/// Icon tag for a medication, by case-insensitive substring match
/// against the rule list.
pub fn medication_icon(name: &str) -> &'static str {
    let lowered = name.to_lowercase();
    ICON_RULES
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}

// ═══════════════════════════════════════════
// View types — serialised to clients
// ═══════════════════════════════════════════

/// One dose occurrence in the today view, carrying the occurrence
/// identity for later mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseView {
    pub id: i64,
    pub reminder_id: i64,
    pub name: String,
    pub dosage: String,
    pub notes: String,
    pub time: String,
    pub status: String,
}

/// A single calendar entry in the monthly view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub name: String,
    pub time: String,
    pub dosage: String,
    pub icon: String,
}

/// Compact list entry: each medicine once, represented by its most
/// recent occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationListItem {
    pub id: i64,
    pub name: String,
    pub dosage: String,
    pub notes: String,
    pub time: String,
    pub status: String,
}

/// Overview entry: includes occurrence-less medicines with fallbacks,
/// enriched with prescriber details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationOverview {
    pub id: i64,
    pub name: String,
    pub dosage: String,
    pub purpose: String,
    pub prescriber: String,
    pub start_date: String,
    pub notes: String,
    pub status: String,
}

/// Full occurrence listing for the calendar screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderListItem {
    pub reminder_id: i64,
    pub medicine_id: i64,
    pub name: String,
    pub dosage: String,
    pub notes: String,
    pub reminder_time: String,
    pub status: String,
}

// ═══════════════════════════════════════════
// Queries
// ═══════════════════════════════════════════

/// Today's occurrences for the acting user, ordered by scheduled time.
pub fn today_doses(
    conn: &Connection,
    user_id: i64,
    day: NaiveDate,
) -> Result<Vec<DoseView>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT m.medicine_id, m.name, m.dosage, m.note, r.remind_at, r.status, r.reminder_id
         FROM medicines m
         JOIN reminders r ON m.medicine_id = r.medicine_id
         WHERE m.client_id = ?1 AND date(r.remind_at) = ?2
         ORDER BY r.remind_at",
    )?;
    let rows = stmt.query_map(
        params![user_id, day.format(DATE_FORMAT).to_string()],
        |row| {
            Ok(DoseView {
                id: row.get(0)?,
                name: row.get(1)?,
                dosage: row.get(2)?,
                notes: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                time: row.get(4)?,
                status: row.get(5)?,
                reminder_id: row.get(6)?,
            })
        },
    )?;

    let mut doses = Vec::new();
    for row in rows {
        doses.push(row?);
    }
    Ok(doses)
}

/// Occurrences for one calendar month, grouped by day-of-month.
pub fn monthly_calendar(
    conn: &Connection,
    user_id: i64,
    year: i32,
    month: u32,
) -> Result<BTreeMap<u32, Vec<CalendarEntry>>, DatabaseError> {
    let month_start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        DatabaseError::ConstraintViolation(format!("invalid calendar month {year}-{month}"))
    })?;
    let next_month = month_start
        .checked_add_months(chrono::Months::new(1))
        .ok_or_else(|| {
            DatabaseError::ConstraintViolation(format!("calendar month out of range {year}-{month}"))
        })?;

    let mut stmt = conn.prepare(
        "SELECT m.name, m.dosage, r.remind_at
         FROM medicines m
         JOIN reminders r ON m.medicine_id = r.medicine_id
         WHERE m.client_id = ?1 AND date(r.remind_at) >= ?2 AND date(r.remind_at) < ?3
         ORDER BY r.remind_at",
    )?;
    let rows = stmt.query_map(
        params![
            user_id,
            month_start.format(DATE_FORMAT).to_string(),
            next_month.format(DATE_FORMAT).to_string()
        ],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        },
    )?;

    let mut calendar: BTreeMap<u32, Vec<CalendarEntry>> = BTreeMap::new();
    for row in rows {
        let (name, dosage, remind_at) = row?;
        let ts = parse_remind_at(&remind_at)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
        let entry = CalendarEntry {
            time: TimeBucket::from_hour(ts.hour()).as_str().to_string(),
            icon: medication_icon(&name).to_string(),
            name,
            dosage,
        };
        calendar.entry(ts.day()).or_default().push(entry);
    }
    Ok(calendar)
}

/// Compact per-medicine list: most recent occurrence as representative;
/// medicines with no occurrences are omitted.
pub fn medication_list(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<MedicationListItem>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT m.medicine_id, m.name, m.dosage, m.note,
                (SELECT r.remind_at FROM reminders r
                 WHERE r.medicine_id = m.medicine_id
                 ORDER BY r.remind_at DESC LIMIT 1) AS latest_time,
                (SELECT r.status FROM reminders r
                 WHERE r.medicine_id = m.medicine_id
                 ORDER BY r.remind_at DESC LIMIT 1) AS latest_status
         FROM medicines m
         WHERE m.client_id = ?1
         ORDER BY m.name",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
        ))
    })?;

    let mut items = Vec::new();
    for row in rows {
        let (id, name, dosage, notes, latest_time, latest_status) = row?;
        // Inner-join shape: no occurrence, no list entry.
        let (Some(time), Some(status)) = (latest_time, latest_status) else {
            continue;
        };
        items.push(MedicationListItem {
            id,
            name,
            dosage,
            notes: notes.unwrap_or_default(),
            time,
            status,
        });
    }
    Ok(items)
}

/// Overview list: every medicine of the acting user, occurrence-less
/// ones included with fallback status/date, optionally filtered by a
/// name substring.
pub fn medication_overview(
    conn: &Connection,
    user_id: i64,
    search: Option<&str>,
    now: NaiveDateTime,
) -> Result<Vec<MedicationOverview>, DatabaseError> {
    let mut sql = String::from(
        "SELECT m.medicine_id, m.name, m.dosage, m.note,
                (SELECT r.remind_at FROM reminders r
                 WHERE r.medicine_id = m.medicine_id
                 ORDER BY r.remind_at DESC LIMIT 1) AS latest_time,
                (SELECT r.status FROM reminders r
                 WHERE r.medicine_id = m.medicine_id
                 ORDER BY r.remind_at DESC LIMIT 1) AS latest_status,
                (SELECT d.name FROM doctors d
                 WHERE d.client_id = m.client_id
                 ORDER BY d.doctor_id LIMIT 1) AS prescriber,
                (SELECT d.specialization FROM doctors d
                 WHERE d.client_id = m.client_id
                 ORDER BY d.doctor_id LIMIT 1) AS purpose
         FROM medicines m
         WHERE m.client_id = ?1",
    );
    if search.is_some() {
        sql.push_str(" AND m.name LIKE ?2 COLLATE NOCASE");
    }
    sql.push_str(" ORDER BY m.name");

    let pattern = search.map(|q| format!("%{}%", q.trim()));
    let mut stmt = conn.prepare(&sql)?;
    let map_row = |row: &rusqlite::Row<'_>| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, Option<String>>(7)?,
        ))
    };
    let rows = match &pattern {
        Some(p) => stmt.query_map(params![user_id, p], map_row)?,
        None => stmt.query_map(params![user_id], map_row)?,
    };

    let mut items = Vec::new();
    for row in rows {
        let (id, name, dosage, notes, latest_time, latest_status, prescriber, purpose) = row?;
        let start_date = match latest_time {
            Some(ts) => ts.split(' ').next().unwrap_or(&ts).to_string(),
            None => now.date().format(DATE_FORMAT).to_string(),
        };
        items.push(MedicationOverview {
            id,
            name,
            dosage,
            purpose: purpose.unwrap_or_else(|| "General Health".to_string()),
            prescriber: prescriber.unwrap_or_else(|| "Dr. Unknown".to_string()),
            start_date,
            notes: notes.unwrap_or_default(),
            status: latest_status.unwrap_or_else(|| "pending".to_string()),
        });
    }
    Ok(items)
}

/// Every occurrence of the acting user's medicines, oldest first.
pub fn user_reminders(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<ReminderListItem>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT r.reminder_id, m.medicine_id, m.name, m.dosage, m.note, r.remind_at, r.status
         FROM medicines m
         JOIN reminders r ON m.medicine_id = r.medicine_id
         WHERE m.client_id = ?1
         ORDER BY r.remind_at",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(ReminderListItem {
            reminder_id: row.get(0)?,
            medicine_id: row.get(1)?,
            name: row.get(2)?,
            dosage: row.get(3)?,
            notes: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            reminder_time: row.get(5)?,
            status: row.get(6)?,
        })
    })?;

    let mut reminders = Vec::new();
    for row in rows {
        reminders.push(row?);
    }
    Ok(reminders)
}
