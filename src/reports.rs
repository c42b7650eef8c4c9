//! Adherence reporting — per-user dashboard stats and the admin-wide
//! summary.

use chrono::{Datelike, Days, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;
use crate::models::reminder::{format_remind_at, DATE_FORMAT};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextDose {
    pub name: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub active_medications: i64,
    pub upcoming_doses: i64,
    pub adherence_rate: i64,
    pub next_dose: Option<NextDose>,
}

/// Per-user dashboard numbers at a given instant.
///
/// "Active" means the medicine still has unresolved occurrences;
/// adherence is completed/total over the current ISO week (Mon–Sun).
pub fn dashboard_stats(
    conn: &Connection,
    user_id: i64,
    now: NaiveDateTime,
) -> Result<DashboardStats, DatabaseError> {
    let today = now.date().format(DATE_FORMAT).to_string();

    let active_medications: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT m.medicine_id)
         FROM medicines m
         JOIN reminders r ON m.medicine_id = r.medicine_id
         WHERE m.client_id = ?1 AND r.status = 'pending'",
        params![user_id],
        |row| row.get(0),
    )?;

    let upcoming_doses: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM medicines m
         JOIN reminders r ON m.medicine_id = r.medicine_id
         WHERE m.client_id = ?1 AND date(r.remind_at) = ?2 AND r.status = 'pending'",
        params![user_id, today],
        |row| row.get(0),
    )?;

    let next_dose = conn
        .query_row(
            "SELECT m.name, r.remind_at
             FROM medicines m
             JOIN reminders r ON m.medicine_id = r.medicine_id
             WHERE m.client_id = ?1 AND r.status = 'pending' AND r.remind_at > ?2
             ORDER BY r.remind_at
             LIMIT 1",
            params![user_id, format_remind_at(&now)],
            |row| {
                Ok(NextDose {
                    name: row.get(0)?,
                    time: row.get(1)?,
                })
            },
        )
        .optional()?;

    let monday = now.date() - Days::new(u64::from(now.weekday().num_days_from_monday()));
    let week_end = monday + Days::new(7);
    let (completed, total): (i64, i64) = conn.query_row(
        "SELECT COALESCE(SUM(CASE WHEN r.status = 'completed' THEN 1 ELSE 0 END), 0),
                COUNT(*)
         FROM medicines m
         JOIN reminders r ON m.medicine_id = r.medicine_id
         WHERE m.client_id = ?1 AND date(r.remind_at) >= ?2 AND date(r.remind_at) < ?3",
        params![
            user_id,
            monday.format(DATE_FORMAT).to_string(),
            week_end.format(DATE_FORMAT).to_string()
        ],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let adherence_rate = if total > 0 {
        (completed as f64 / total as f64 * 100.0).round() as i64
    } else {
        0
    };

    Ok(DashboardStats {
        active_medications,
        upcoming_doses,
        adherence_rate,
        next_dose,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSummary {
    pub users: i64,
    pub medicines: i64,
    pub reminders: i64,
    pub completed_reminders: i64,
    pub adherence_percent: f64,
}

/// System-wide counts and overall adherence, for the admin reports screen.
pub fn admin_summary(conn: &Connection) -> Result<AdminSummary, DatabaseError> {
    let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    let medicines: i64 = conn.query_row("SELECT COUNT(*) FROM medicines", [], |row| row.get(0))?;
    let reminders: i64 = conn.query_row("SELECT COUNT(*) FROM reminders", [], |row| row.get(0))?;
    let completed_reminders: i64 = conn.query_row(
        "SELECT COUNT(*) FROM reminders WHERE status = 'completed'",
        [],
        |row| row.get(0),
    )?;

    let adherence_percent = if reminders > 0 {
        (completed_reminders as f64 / reminders as f64 * 10000.0).round() / 100.0
    } else {
        0.0
    };

    Ok(AdminSummary {
        users,
        medicines,
        reminders,
        completed_reminders,
        adherence_percent,
    })
}
