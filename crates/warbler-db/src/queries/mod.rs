mod follows;
mod likes;
mod messages;
mod users;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{DbError, Result};

fn user_exists(conn: &Connection, id: i64) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn require_user(conn: &Connection, id: i64) -> Result<()> {
    if user_exists(conn, id)? { Ok(()) } else { Err(DbError::NotFound("user")) }
}

fn count(conn: &Connection, sql: &str, id: i64) -> Result<u64> {
    let n: i64 = conn.query_row(sql, params![id], |r| r.get(0))?;
    Ok(n as u64)
}
