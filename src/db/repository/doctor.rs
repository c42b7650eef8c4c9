use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::Doctor;

pub fn insert_doctor(
    conn: &Connection,
    client_id: i64,
    name: &str,
    specialization: Option<&str>,
    contact: Option<&str>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (client_id, name, specialization, contact) VALUES (?1, ?2, ?3, ?4)",
        params![client_id, name, specialization, contact],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_doctors(conn: &Connection, client_id: i64) -> Result<Vec<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT doctor_id, client_id, name, specialization, contact
         FROM doctors WHERE client_id = ?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![client_id], doctor_from_row)?;

    let mut doctors = Vec::new();
    for row in rows {
        doctors.push(row?);
    }
    Ok(doctors)
}

/// Update an owned doctor. Returns 0 when the row is missing or foreign.
pub fn update_doctor(
    conn: &Connection,
    doctor_id: i64,
    client_id: i64,
    name: &str,
    specialization: Option<&str>,
    contact: Option<&str>,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET name = ?1, specialization = ?2, contact = ?3
         WHERE doctor_id = ?4 AND client_id = ?5",
        params![name, specialization, contact, doctor_id, client_id],
    )?;
    Ok(changed)
}

pub fn delete_doctor(
    conn: &Connection,
    doctor_id: i64,
    client_id: i64,
) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM doctors WHERE doctor_id = ?1 AND client_id = ?2",
        params![doctor_id, client_id],
    )?;
    Ok(deleted)
}

fn doctor_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        doctor_id: row.get(0)?,
        client_id: row.get(1)?,
        name: row.get(2)?,
        specialization: row.get(3)?,
        contact: row.get(4)?,
    })
}
