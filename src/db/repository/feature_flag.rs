use std::collections::BTreeMap;

use rusqlite::{params, Connection};

use crate::db::DatabaseError;

pub fn all_flags(conn: &Connection) -> Result<BTreeMap<String, String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT flag_key, flag_value FROM feature_flags")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut flags = BTreeMap::new();
    for row in rows {
        let (key, value): (String, String) = row?;
        flags.insert(key, value);
    }
    Ok(flags)
}

pub fn set_flag(conn: &Connection, key: &str, value: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO feature_flags (flag_key, flag_value) VALUES (?1, ?2)
         ON CONFLICT(flag_key) DO UPDATE SET flag_value = excluded.flag_value",
        params![key, value],
    )?;
    Ok(())
}
