use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::db::DatabaseError;
use crate::models::reminder::{format_remind_at, parse_remind_at, DATE_FORMAT};
use crate::models::{Reminder, ReminderStatus};

pub fn insert_reminder(
    conn: &Connection,
    medicine_id: i64,
    remind_at: &chrono::NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO reminders (medicine_id, remind_at, status) VALUES (?1, ?2, 'pending')",
        params![medicine_id, format_remind_at(remind_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_reminder(conn: &Connection, reminder_id: i64) -> Result<Option<Reminder>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT reminder_id, medicine_id, remind_at, status
             FROM reminders WHERE reminder_id = ?1",
            params![reminder_id],
            reminder_row,
        )
        .optional()?;
    row.map(reminder_from_parts).transpose()
}

/// A reminder together with the owning medicine's client id, for ownership checks.
pub fn reminder_with_owner(
    conn: &Connection,
    reminder_id: i64,
) -> Result<Option<(Reminder, Option<i64>)>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT r.reminder_id, r.medicine_id, r.remind_at, r.status, m.client_id
             FROM reminders r
             JOIN medicines m ON r.medicine_id = m.medicine_id
             WHERE r.reminder_id = ?1",
            params![reminder_id],
            |row| Ok((reminder_row(row)?, row.get::<_, Option<i64>>(4)?)),
        )
        .optional()?;

    match row {
        Some((parts, owner)) => Ok(Some((reminder_from_parts(parts)?, owner))),
        None => Ok(None),
    }
}

pub fn set_reminder_status(
    conn: &Connection,
    reminder_id: i64,
    status: ReminderStatus,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE reminders SET status = ?1 WHERE reminder_id = ?2",
        params![status.as_str(), reminder_id],
    )?;
    Ok(changed)
}

/// Today's occurrence for a medicine owned by the acting user, if any.
pub fn todays_reminder_for_medicine(
    conn: &Connection,
    medicine_id: i64,
    user_id: i64,
    day: NaiveDate,
) -> Result<Option<i64>, DatabaseError> {
    let id: Option<i64> = conn
        .query_row(
            "SELECT r.reminder_id
             FROM medicines m
             JOIN reminders r ON m.medicine_id = r.medicine_id
             WHERE m.medicine_id = ?1 AND m.client_id = ?2 AND date(r.remind_at) = ?3
             ORDER BY r.remind_at
             LIMIT 1",
            params![medicine_id, user_id, day.format(DATE_FORMAT).to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

pub fn delete_reminder(conn: &Connection, reminder_id: i64) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM reminders WHERE reminder_id = ?1",
        params![reminder_id],
    )?;
    Ok(deleted)
}

pub fn count_reminders_for_medicine(
    conn: &Connection,
    medicine_id: i64,
) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM reminders WHERE medicine_id = ?1",
        params![medicine_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Global reminder listing for the admin table, most recent first.
#[derive(Debug, Clone, Serialize)]
pub struct AdminReminderRow {
    pub id: i64,
    pub medicine_id: i64,
    pub medicine_name: String,
    pub reminder_time: String,
    pub status: String,
    pub client_id: Option<i64>,
}

pub fn list_reminders_admin(conn: &Connection) -> Result<Vec<AdminReminderRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT r.reminder_id, r.medicine_id, m.name, r.remind_at, r.status, m.client_id
         FROM reminders r
         JOIN medicines m ON r.medicine_id = m.medicine_id
         ORDER BY r.remind_at DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(AdminReminderRow {
            id: row.get(0)?,
            medicine_id: row.get(1)?,
            medicine_name: row.get(2)?,
            reminder_time: row.get(3)?,
            status: row.get(4)?,
            client_id: row.get(5)?,
        })
    })?;

    let mut reminders = Vec::new();
    for row in rows {
        reminders.push(row?);
    }
    Ok(reminders)
}

type ReminderParts = (i64, i64, String, String);

fn reminder_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReminderParts> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn reminder_from_parts(parts: ReminderParts) -> Result<Reminder, DatabaseError> {
    let (reminder_id, medicine_id, remind_at, status) = parts;
    Ok(Reminder {
        reminder_id,
        medicine_id,
        remind_at: parse_remind_at(&remind_at)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        status: ReminderStatus::from_str(&status)?,
    })
}
