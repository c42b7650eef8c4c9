use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::Medicine;

pub fn insert_medicine(
    conn: &Connection,
    client_id: Option<i64>,
    name: &str,
    dosage: &str,
    note: Option<&str>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO medicines (client_id, name, dosage, note) VALUES (?1, ?2, ?3, ?4)",
        params![client_id, name, dosage, note],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_medicine(conn: &Connection, medicine_id: i64) -> Result<Option<Medicine>, DatabaseError> {
    let med = conn
        .query_row(
            "SELECT medicine_id, client_id, name, dosage, note
             FROM medicines WHERE medicine_id = ?1",
            params![medicine_id],
            medicine_from_row,
        )
        .optional()?;
    Ok(med)
}

/// Parent-exists check scoping every reminder operation to the acting user.
pub fn medicine_owned_by(
    conn: &Connection,
    medicine_id: i64,
    user_id: i64,
) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT medicine_id FROM medicines WHERE medicine_id = ?1 AND client_id = ?2",
            params![medicine_id, user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Delete an owned medicine. Reminders cascade via foreign key.
pub fn delete_medicine(
    conn: &Connection,
    medicine_id: i64,
    user_id: i64,
) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM medicines WHERE medicine_id = ?1 AND client_id = ?2",
        params![medicine_id, user_id],
    )?;
    Ok(deleted)
}

pub fn update_medicine(
    conn: &Connection,
    medicine_id: i64,
    name: &str,
    dosage: &str,
    note: Option<&str>,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE medicines SET name = ?1, dosage = ?2, note = ?3 WHERE medicine_id = ?4",
        params![name, dosage, note, medicine_id],
    )?;
    Ok(changed)
}

/// Unscoped delete for the admin surface.
pub fn delete_medicine_admin(conn: &Connection, medicine_id: i64) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM medicines WHERE medicine_id = ?1",
        params![medicine_id],
    )?;
    Ok(deleted)
}

/// All medicines with their owner's name, for the admin table.
pub fn list_medicines_with_owner(
    conn: &Connection,
) -> Result<Vec<(Medicine, Option<String>)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT m.medicine_id, m.client_id, m.name, m.dosage, m.note, u.name
         FROM medicines m
         LEFT JOIN users u ON m.client_id = u.user_id
         ORDER BY m.name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((medicine_from_row(row)?, row.get::<_, Option<String>>(5)?))
    })?;

    let mut meds = Vec::new();
    for row in rows {
        meds.push(row?);
    }
    Ok(meds)
}

fn medicine_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Medicine> {
    Ok(Medicine {
        medicine_id: row.get(0)?,
        client_id: row.get(1)?,
        name: row.get(2)?,
        dosage: row.get(3)?,
        note: row.get(4)?,
    })
}
