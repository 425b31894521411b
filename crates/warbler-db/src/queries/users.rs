use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;
use warbler_types::models::{DEFAULT_HEADER_IMAGE_URL, ProfileUpdate, UserId, UserStats};

use super::count;
use crate::Database;
use crate::error::{DbError, Result};
use crate::models::{NewUser, USER_COLUMNS, UserRow, encode_timestamp};

impl Database {
    /// Inserts a user. A taken username or email fails with
    /// [`DbError::Duplicate`] and writes nothing.
    pub fn create_user(&self, new: &NewUser<'_>) -> Result<UserRow> {
        let now = encode_timestamp(Utc::now());
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, image_url, header_image_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    new.username,
                    new.email,
                    new.password_hash,
                    new.image_url,
                    DEFAULT_HEADER_IMAGE_URL,
                    now
                ],
            )
            .map_err(DbError::from_write)?;

            let id = conn.last_insert_rowid();
            info!(user_id = id, username = new.username, "user created");
            query_user_by_id(conn, id)?.ok_or(DbError::NotFound("user"))
        })
    }

    pub fn get_user_by_id(&self, id: UserId) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1");
            Ok(conn
                .query_row(&sql, params![username], UserRow::from_row)
                .optional()?)
        })
    }

    /// Like [`Database::get_user_by_id`] but a missing user is an error.
    pub fn find_user(&self, id: UserId) -> Result<UserRow> {
        self.get_user_by_id(id)?.ok_or(DbError::NotFound("user"))
    }

    /// All users ordered by username, optionally restricted to usernames
    /// containing `query`. Matching is a case-sensitive substring test; `%`
    /// and `_` have no special meaning.
    pub fn search_users(&self, query: Option<&str>) -> Result<Vec<UserRow>> {
        let query = query.filter(|q| !q.is_empty());
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users u
                 WHERE ?1 IS NULL OR instr(u.username, ?1) > 0
                 ORDER BY u.username"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![query], UserRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Replaces the editable profile fields in one statement.
    pub fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> Result<UserRow> {
        self.with_tx(|tx| {
            let changed = tx
                .execute(
                    "UPDATE users
                     SET username = ?1, email = ?2, image_url = ?3, header_image_url = ?4, bio = ?5
                     WHERE id = ?6",
                    params![
                        update.username,
                        update.email,
                        update.image_url,
                        update.header_image_url,
                        update.bio,
                        id
                    ],
                )
                .map_err(DbError::from_write)?;

            if changed == 0 {
                return Err(DbError::NotFound("user"));
            }
            query_user_by_id(tx, id)?.ok_or(DbError::NotFound("user"))
        })
    }

    /// Deletes a user. Their messages, likes (given and received on their
    /// messages) and follow edges in both directions go with them.
    pub fn delete_user(&self, id: UserId) -> Result<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
            if deleted == 0 {
                return Err(DbError::NotFound("user"));
            }
            info!(user_id = id, "user deleted");
            Ok(())
        })
    }

    pub fn user_stats(&self, id: UserId) -> Result<UserStats> {
        self.with_conn(|conn| {
            Ok(UserStats {
                messages: count(conn, "SELECT COUNT(*) FROM messages WHERE user_id = ?1", id)?,
                following: count(conn, "SELECT COUNT(*) FROM follows WHERE follower_id = ?1", id)?,
                followers: count(conn, "SELECT COUNT(*) FROM follows WHERE followed_id = ?1", id)?,
                likes: count(conn, "SELECT COUNT(*) FROM messages_liked WHERE user_id = ?1", id)?,
            })
        })
    }
}

pub(super) fn query_user_by_id(conn: &Connection, id: UserId) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1");
    Ok(conn.query_row(&sql, params![id], UserRow::from_row).optional()?)
}

#[cfg(test)]
mod tests {
    use warbler_types::models::DEFAULT_IMAGE_URL;

    use crate::testutil::{db, message, user};
    use super::*;

    #[test]
    fn create_and_fetch_user() {
        let db = db();
        let alice = user(&db, "alice");

        assert_eq!(alice.username, "alice");
        assert_eq!(alice.email, "alice@example.com");
        assert_eq!(alice.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(alice.header_image_url, DEFAULT_HEADER_IMAGE_URL);
        assert_eq!(alice.bio, None);

        let by_name = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, alice.id);
        assert!(db.get_user_by_username("Alice").unwrap().is_none());
        assert!(db.get_user_by_id(alice.id + 100).unwrap().is_none());
        assert!(db.find_user(alice.id + 100).unwrap_err().is_not_found());
    }

    #[test]
    fn duplicate_username_or_email_is_rejected() {
        let db = db();
        user(&db, "alice");

        let err = db
            .create_user(&NewUser {
                username: "alice",
                email: "other@example.com",
                password_hash: "h",
                image_url: DEFAULT_IMAGE_URL,
            })
            .unwrap_err();
        assert!(matches!(err, DbError::Duplicate("username")));

        let err = db
            .create_user(&NewUser {
                username: "alice2",
                email: "alice@example.com",
                password_hash: "h",
                image_url: DEFAULT_IMAGE_URL,
            })
            .unwrap_err();
        assert!(matches!(err, DbError::Duplicate("email")));

        assert_eq!(db.search_users(None).unwrap().len(), 1);
    }

    #[test]
    fn search_is_case_sensitive_substring() {
        let db = db();
        user(&db, "alice");
        user(&db, "malice");
        user(&db, "bob");
        user(&db, "a_b");

        let names = |q| {
            db.search_users(q)
                .unwrap()
                .into_iter()
                .map(|u| u.username)
                .collect::<Vec<_>>()
        };

        assert_eq!(names(None), ["a_b", "alice", "bob", "malice"]);
        assert_eq!(names(Some("")), ["a_b", "alice", "bob", "malice"]);
        assert_eq!(names(Some("lic")), ["alice", "malice"]);
        assert!(names(Some("LIC")).is_empty());
        assert_eq!(names(Some("_")), ["a_b"]);
        assert!(names(Some("%")).is_empty());
    }

    #[test]
    fn update_profile_applies_all_fields() {
        let db = db();
        let alice = user(&db, "alice");

        let updated = db
            .update_profile(
                alice.id,
                &ProfileUpdate {
                    username: "alicia".into(),
                    email: "alicia@example.com".into(),
                    image_url: "/me.png".into(),
                    header_image_url: "/header.jpg".into(),
                    bio: Some("hi".into()),
                },
            )
            .unwrap();

        assert_eq!(updated.username, "alicia");
        assert_eq!(updated.email, "alicia@example.com");
        assert_eq!(updated.image_url, "/me.png");
        assert_eq!(updated.header_image_url, "/header.jpg");
        assert_eq!(updated.bio.as_deref(), Some("hi"));
        assert_eq!(updated.password, alice.password);
    }

    #[test]
    fn update_profile_conflict_changes_nothing() {
        let db = db();
        let alice = user(&db, "alice");
        user(&db, "bob");

        let err = db
            .update_profile(
                alice.id,
                &ProfileUpdate {
                    username: "bob".into(),
                    email: "new@example.com".into(),
                    image_url: DEFAULT_IMAGE_URL.into(),
                    header_image_url: DEFAULT_HEADER_IMAGE_URL.into(),
                    bio: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::Duplicate("username")));

        let unchanged = db.find_user(alice.id).unwrap();
        assert_eq!(unchanged.username, "alice");
        assert_eq!(unchanged.email, "alice@example.com");
    }

    #[test]
    fn delete_user_cascades() {
        let db = db();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");

        let hers = message(&db, &alice, "alice's post", 0);
        let his = message(&db, &bob, "bob's post", 1);
        db.follow(alice.id, bob.id).unwrap();
        db.follow(bob.id, alice.id).unwrap();
        db.toggle_like(alice.id, his.id).unwrap();
        db.toggle_like(bob.id, hers.id).unwrap();

        db.delete_user(alice.id).unwrap();

        assert!(db.get_user_by_id(alice.id).unwrap().is_none());
        assert!(db.get_message(hers.id).unwrap().is_none());
        assert!(db.followers_of(bob.id).unwrap().is_empty());
        assert!(db.following_of(bob.id).unwrap().is_empty());
        assert!(!db.is_liked_by(his.id, alice.id).unwrap());

        let orphans: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT (SELECT COUNT(*) FROM messages WHERE user_id = ?1)
                          + (SELECT COUNT(*) FROM messages_liked WHERE user_id = ?1)
                          + (SELECT COUNT(*) FROM messages_liked WHERE message_id = ?2)
                          + (SELECT COUNT(*) FROM follows WHERE follower_id = ?1 OR followed_id = ?1)",
                    params![alice.id, hers.id],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(orphans, 0);

        assert!(db.delete_user(alice.id).unwrap_err().is_not_found());
    }

    #[test]
    fn stats_count_relations() {
        let db = db();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let carol = user(&db, "carol");

        let m = message(&db, &alice, "one", 0);
        message(&db, &alice, "two", 1);
        db.follow(alice.id, bob.id).unwrap();
        db.follow(carol.id, alice.id).unwrap();
        db.follow(bob.id, alice.id).unwrap();
        db.toggle_like(alice.id, m.id).unwrap();

        let stats = db.user_stats(alice.id).unwrap();
        assert_eq!(
            stats,
            UserStats { messages: 2, following: 1, followers: 2, likes: 1 }
        );
    }
}
