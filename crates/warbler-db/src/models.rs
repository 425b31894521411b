//! Database row types. These map directly to SQLite rows and are converted
//! into the `warbler-types` models at the crate boundary; only `UserRow`
//! carries the password hash.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use warbler_types::models::{Message, MessageId, User, UserId};

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub image_url: &'a str,
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: MessageId,
    pub user_id: UserId,
    pub author_username: String,
    pub author_image_url: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

pub(crate) const USER_COLUMNS: &str = "u.id, u.username, u.email, u.password, u.image_url, \
     u.header_image_url, u.bio, u.location, u.created_at";

pub(crate) const MESSAGE_SELECT: &str = "SELECT m.id, m.user_id, u.username, u.image_url, m.text, m.created_at
     FROM messages m
     JOIN users u ON u.id = m.user_id";

impl UserRow {
    /// Maps a row selected with [`USER_COLUMNS`].
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            image_url: row.get(4)?,
            header_image_url: row.get(5)?,
            bio: row.get(6)?,
            location: row.get(7)?,
            created_at: decode_timestamp(row, 8)?,
        })
    }
}

impl MessageRow {
    /// Maps a row selected with [`MESSAGE_SELECT`].
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            author_username: row.get(2)?,
            author_image_url: row.get(3)?,
            text: row.get(4)?,
            created_at: decode_timestamp(row, 5)?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            image_url: row.image_url,
            header_image_url: row.header_image_url,
            bio: row.bio,
            location: row.location,
            created_at: row.created_at,
        }
    }
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            author_username: row.author_username,
            author_image_url: row.author_image_url,
            text: row.text,
            created_at: row.created_at,
        }
    }
}

/// Fixed-width RFC 3339 in UTC, so text order matches time order.
pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
