//! User-driven dose status transitions.
//!
//! `taken` resolves a pending occurrence to completed and appends an
//! action-log entry; `not-taken` reverts a completed occurrence to
//! pending. Both are restricted to occurrences scheduled for the
//! current date and owned by the acting user. Missed occurrences are
//! terminal for both actions.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use thiserror::Error;

use crate::db::repository::{append_action, reminder_with_owner, set_reminder_status};
use crate::db::DatabaseError;
use crate::models::{DoseAction, ReminderStatus};

#[derive(Debug, Error)]
pub enum DoseStatusError {
    #[error("Reminder not found or access denied")]
    NotFound,

    #[error("Reminder is not scheduled for the current date")]
    NotToday,

    #[error("A missed dose cannot be changed")]
    MissedLocked,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Apply a user action to one occurrence, returning its resulting status.
///
/// The action-log append is deliberately outside the status update:
/// a logging failure must never fail the transition itself.
pub fn set_dose_status(
    conn: &Connection,
    reminder_id: i64,
    action: DoseAction,
    user_id: i64,
    today: NaiveDate,
    now: NaiveDateTime,
) -> Result<ReminderStatus, DoseStatusError> {
    let (reminder, owner) =
        reminder_with_owner(conn, reminder_id)?.ok_or(DoseStatusError::NotFound)?;
    if owner != Some(user_id) {
        return Err(DoseStatusError::NotFound);
    }
    if reminder.remind_at.date() != today {
        return Err(DoseStatusError::NotToday);
    }

    let new_status = match (action, reminder.status) {
        (DoseAction::Taken, ReminderStatus::Pending) => ReminderStatus::Completed,
        (DoseAction::Taken, ReminderStatus::Completed) => return Ok(ReminderStatus::Completed),
        (DoseAction::NotTaken, ReminderStatus::Completed) => ReminderStatus::Pending,
        (DoseAction::NotTaken, ReminderStatus::Pending) => return Ok(ReminderStatus::Pending),
        (_, ReminderStatus::Missed) => return Err(DoseStatusError::MissedLocked),
    };

    set_reminder_status(conn, reminder_id, new_status)?;

    if new_status == ReminderStatus::Completed {
        if let Err(e) = append_action(conn, reminder_id, "Taken", now) {
            tracing::warn!("Could not record dose action for reminder {reminder_id}: {e}");
        }
    }

    Ok(new_status)
}
