use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors produced by the storage layer.
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLite error not covered by a more specific variant.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A uniqueness constraint rejected the write. Carries the column name.
    #[error("{0} already taken")]
    Duplicate(&'static str),

    /// The referenced row does not exist. Carries the entity name.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Users cannot follow themselves")]
    SelfFollow,

    /// The actor does not own the row it tried to change.
    #[error("Not permitted")]
    Forbidden,

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Migration error: {0}")]
    Migration(String),
}

impl DbError {
    /// Classifies a failed INSERT/UPDATE, turning unique violations on the
    /// users table into [`DbError::Duplicate`].
    pub(crate) fn from_write(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, Some(msg)) = &err {
            if code.code == ErrorCode::ConstraintViolation
                && code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            {
                if msg.contains("users.email") {
                    return Self::Duplicate("email");
                }
                if msg.contains("users.username") {
                    return Self::Duplicate("username");
                }
            }
        }
        Self::Sqlite(err)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DbError>;
