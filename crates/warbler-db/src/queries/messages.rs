use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;
use warbler_types::models::{MessageId, UserId};

use crate::Database;
use crate::error::{DbError, Result};
use crate::models::{MESSAGE_SELECT, MessageRow, encode_timestamp};

impl Database {
    pub fn create_message(
        &self,
        author: UserId,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> Result<MessageRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (text, created_at, user_id) VALUES (?1, ?2, ?3)",
                params![text, encode_timestamp(created_at), author],
            )?;
            let id = conn.last_insert_rowid();
            info!(message_id = id, user_id = author, "message created");
            query_message(conn, id)?.ok_or(DbError::NotFound("message"))
        })
    }

    pub fn get_message(&self, id: MessageId) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    /// A user's own messages, newest first.
    pub fn messages_by_user(&self, author: UserId, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{MESSAGE_SELECT}
                 WHERE m.user_id = ?1
                 ORDER BY m.created_at DESC, m.id DESC
                 LIMIT ?2"
            );
            query_messages(conn, &sql, params![author, limit])
        })
    }

    /// Deletes a message on behalf of `actor`, who must be its author.
    pub fn delete_message(&self, id: MessageId, actor: UserId) -> Result<()> {
        self.with_tx(|tx| {
            let owner: Option<UserId> = tx
                .query_row("SELECT user_id FROM messages WHERE id = ?1", params![id], |r| {
                    r.get(0)
                })
                .optional()?;

            match owner {
                None => Err(DbError::NotFound("message")),
                Some(owner) if owner != actor => Err(DbError::Forbidden),
                Some(_) => {
                    tx.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
                    info!(message_id = id, user_id = actor, "message deleted");
                    Ok(())
                }
            }
        })
    }

    /// Messages written by `user` or anyone `user` follows, newest first,
    /// at most `limit` of them.
    pub fn home_feed(&self, user: UserId, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{MESSAGE_SELECT}
                 WHERE m.user_id = ?1
                    OR m.user_id IN (SELECT followed_id FROM follows WHERE follower_id = ?1)
                 ORDER BY m.created_at DESC, m.id DESC
                 LIMIT ?2"
            );
            query_messages(conn, &sql, params![user, limit])
        })
    }
}

fn query_message(conn: &Connection, id: MessageId) -> Result<Option<MessageRow>> {
    let sql = format!("{MESSAGE_SELECT} WHERE m.id = ?1");
    Ok(conn.query_row(&sql, params![id], MessageRow::from_row).optional()?)
}

pub(super) fn query_messages(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, MessageRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
