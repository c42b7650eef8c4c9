use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::reminder::DATETIME_FORMAT;
use crate::models::{Role, User};

pub fn insert_user(
    conn: &Connection,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO users (name, email, password, role) VALUES (?1, ?2, ?3, ?4)",
        params![name, email, password_hash, role.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_client_profile(
    conn: &Connection,
    user_id: i64,
    age: Option<i64>,
    gender: Option<&str>,
    contact: Option<&str>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clients (client_id, age, gender, contact) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, age, gender, contact],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT user_id, name, email, password, role FROM users WHERE user_id = ?1",
            params![user_id],
            user_from_row,
        )
        .optional()?;
    row.transpose()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT user_id, name, email, password, role FROM users WHERE email = ?1",
            params![email],
            user_from_row,
        )
        .optional()?;
    row.transpose()
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT user_id FROM users WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Role lookup used when a request authenticates via a raw user-id header.
pub fn get_user_role(conn: &Connection, user_id: i64) -> Result<Option<Role>, DatabaseError> {
    let role: Option<String> = conn
        .query_row(
            "SELECT role FROM users WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    role.map(|s| Role::from_str(&s)).transpose()
}

/// Record an admin login timestamp; creates the admins row on first login.
pub fn touch_admin_login(
    conn: &Connection,
    user_id: i64,
    at: NaiveDateTime,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO admins (admin_id, last_login) VALUES (?1, ?2)
         ON CONFLICT(admin_id) DO UPDATE SET last_login = excluded.last_login",
        params![user_id, at.format(DATETIME_FORMAT).to_string()],
    )?;
    Ok(())
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT user_id, name, email, password, role FROM users ORDER BY user_id DESC",
    )?;
    let rows = stmt.query_map([], user_from_row)?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row??);
    }
    Ok(users)
}

pub fn update_user(
    conn: &Connection,
    user_id: i64,
    name: &str,
    email: &str,
    role: Role,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET name = ?1, email = ?2, role = ?3 WHERE user_id = ?4",
        params![name, email, role.as_str(), user_id],
    )?;
    Ok(changed)
}

/// Delete a user. The client profile row (and owned medicines/reminders)
/// go with it via ON DELETE CASCADE.
pub fn delete_user(conn: &Connection, user_id: i64) -> Result<usize, DatabaseError> {
    let deleted = conn.execute("DELETE FROM users WHERE user_id = ?1", params![user_id])?;
    Ok(deleted)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<User, DatabaseError>> {
    let user_id = row.get(0)?;
    let name = row.get(1)?;
    let email = row.get(2)?;
    let password_hash = row.get(3)?;
    let role_str: String = row.get(4)?;
    Ok(Role::from_str(&role_str).map(|role| User {
        user_id,
        name,
        email,
        password_hash,
        role,
    }))
}
