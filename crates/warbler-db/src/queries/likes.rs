use std::collections::HashSet;

use rusqlite::params;
use tracing::debug;
use warbler_types::models::{LikedState, MessageId, UserId};

use super::messages::query_messages;
use crate::Database;
use crate::error::{DbError, Result};
use crate::models::{MESSAGE_SELECT, MessageRow};

impl Database {
    /// Flips `user`'s like on `message`. Keyed on the (user, message) pair
    /// alone: remove the pair if present, otherwise insert it.
    pub fn toggle_like(&self, user: UserId, message: MessageId) -> Result<LikedState> {
        self.with_tx(|tx| {
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM messages WHERE id = ?1)",
                params![message],
                |r| r.get(0),
            )?;
            if !exists {
                return Err(DbError::NotFound("message"));
            }

            let removed = tx.execute(
                "DELETE FROM messages_liked WHERE user_id = ?1 AND message_id = ?2",
                params![user, message],
            )?;

            let state = if removed > 0 {
                LikedState::Unliked
            } else {
                tx.execute(
                    "INSERT INTO messages_liked (user_id, message_id) VALUES (?1, ?2)",
                    params![user, message],
                )?;
                LikedState::Liked
            };

            debug!(user_id = user, message_id = message, ?state, "like toggled");
            Ok(state)
        })
    }

    pub fn is_liked_by(&self, message: MessageId, user: UserId) -> Result<bool> {
        self.with_conn(|conn| {
            let liked: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM messages_liked WHERE user_id = ?1 AND message_id = ?2)",
                params![user, message],
                |r| r.get(0),
            )?;
            Ok(liked)
        })
    }

    /// Messages `user` has liked, newest first.
    pub fn liked_messages(&self, user: UserId) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{MESSAGE_SELECT}
                 JOIN messages_liked l ON l.message_id = m.id
                 WHERE l.user_id = ?1
                 ORDER BY m.created_at DESC, m.id DESC"
            );
            query_messages(conn, &sql, params![user])
        })
    }

    /// Ids of every message `user` has liked, for marking listings.
    pub fn liked_message_ids(&self, user: UserId) -> Result<HashSet<MessageId>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT message_id FROM messages_liked WHERE user_id = ?1")?;
            let ids = stmt
                .query_map(params![user], |r| r.get(0))?
                .collect::<std::result::Result<HashSet<_>, _>>()?;
            Ok(ids)
        })
    }
}
