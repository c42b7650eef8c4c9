use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::db::DatabaseError;
use crate::models::reminder::DATETIME_FORMAT;

/// Append a completed-dose action. The log is append-only.
pub fn append_action(
    conn: &Connection,
    reminder_id: i64,
    action: &str,
    at: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO action_log (reminder_id, action, timestamp) VALUES (?1, ?2, ?3)",
        params![reminder_id, action, at.format(DATETIME_FORMAT).to_string()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Joined log entry for the admin listing.
#[derive(Debug, Clone, Serialize)]
pub struct ActionLogEntry {
    pub id: i64,
    pub reminder_id: i64,
    pub action: String,
    pub created_at: String,
    pub medicine_id: Option<i64>,
    pub medicine_name: Option<String>,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
}

pub fn list_recent_actions(
    conn: &Connection,
    limit: u32,
) -> Result<Vec<ActionLogEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT l.log_id, l.reminder_id, l.action, l.timestamp,
                m.medicine_id, m.name, m.client_id, u.name
         FROM action_log l
         LEFT JOIN reminders r ON l.reminder_id = r.reminder_id
         LEFT JOIN medicines m ON r.medicine_id = m.medicine_id
         LEFT JOIN users u ON m.client_id = u.user_id
         ORDER BY l.timestamp DESC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok(ActionLogEntry {
            id: row.get(0)?,
            reminder_id: row.get(1)?,
            action: row.get(2)?,
            created_at: row.get(3)?,
            medicine_id: row.get(4)?,
            medicine_name: row.get(5)?,
            client_id: row.get(6)?,
            client_name: row.get(7)?,
        })
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}
