//! Schema migrations, tracked in a `schema_version` table so each step runs
//! exactly once per database file.

use rusqlite::Connection;
use tracing::info;

use crate::error::{DbError, Result};

pub const CURRENT_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        v1_initial(conn).map_err(|e| DbError::Migration(e.to_string()))?;
    }

    info!(version = CURRENT_VERSION, "Database migrations complete");
    Ok(())
}

fn v1_initial(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        BEGIN;

        CREATE TABLE users (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            username          TEXT NOT NULL UNIQUE,
            email             TEXT NOT NULL UNIQUE,
            password          TEXT NOT NULL,
            image_url         TEXT NOT NULL,
            header_image_url  TEXT NOT NULL,
            bio               TEXT,
            location          TEXT,
            created_at        TEXT NOT NULL
        );

        CREATE TABLE messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            text        TEXT NOT NULL CHECK (length(text) <= 140),
            created_at  TEXT NOT NULL,
            user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX idx_messages_user_created
            ON messages(user_id, created_at);

        CREATE INDEX idx_messages_created
            ON messages(created_at);

        CREATE TABLE follows (
            follower_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            followed_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (follower_id, followed_id),
            CHECK (follower_id <> followed_id)
        );

        CREATE INDEX idx_follows_followed
            ON follows(followed_id);

        CREATE TABLE messages_liked (
            user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            message_id  INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, message_id)
        );

        CREATE INDEX idx_messages_liked_message
            ON messages_liked(message_id);

        INSERT INTO schema_version (version) VALUES (1);

        COMMIT;
        ",
    )
}
