use rusqlite::{Connection, params};
use tracing::debug;
use warbler_types::models::UserId;

use super::require_user;
use crate::Database;
use crate::error::{DbError, Result};
use crate::models::{USER_COLUMNS, UserRow};

impl Database {
    /// Adds the edge `follower -> followed`. Returns `false` when the edge
    /// already existed; the pair's primary key makes repeats a no-op.
    pub fn follow(&self, follower: UserId, followed: UserId) -> Result<bool> {
        if follower == followed {
            return Err(DbError::SelfFollow);
        }

        self.with_tx(|tx| {
            require_user(tx, followed)?;
            let inserted = tx.execute(
                "INSERT INTO follows (follower_id, followed_id) VALUES (?1, ?2)
                 ON CONFLICT DO NOTHING",
                params![follower, followed],
            )?;
            debug!(follower, followed, inserted, "follow");
            Ok(inserted == 1)
        })
    }

    /// Removes the edge `follower -> followed`. Returns `false` when there
    /// was nothing to remove.
    pub fn unfollow(&self, follower: UserId, followed: UserId) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                params![follower, followed],
            )?;
            debug!(follower, followed, removed, "unfollow");
            Ok(removed > 0)
        })
    }

    /// Users that `user` follows, by username.
    pub fn following_of(&self, user: UserId) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_edge_users(
                conn,
                "JOIN follows f ON f.followed_id = u.id WHERE f.follower_id = ?1",
                user,
            )
        })
    }

    /// Users following `user`, by username.
    pub fn followers_of(&self, user: UserId) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_edge_users(
                conn,
                "JOIN follows f ON f.follower_id = u.id WHERE f.followed_id = ?1",
                user,
            )
        })
    }

    /// Whether `a` follows `b`.
    pub fn is_following(&self, a: UserId, b: UserId) -> Result<bool> {
        self.with_conn(|conn| {
            let found: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2)",
                params![a, b],
                |r| r.get(0),
            )?;
            Ok(found)
        })
    }

    /// Whether `a` is followed by `b`.
    pub fn is_followed_by(&self, a: UserId, b: UserId) -> Result<bool> {
        self.is_following(b, a)
    }
}

fn query_edge_users(conn: &Connection, join_and_filter: &str, user: UserId) -> Result<Vec<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u {join_and_filter} ORDER BY u.username");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user], UserRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use crate::testutil::{db, user};
    use super::*;

    fn names(rows: Vec<UserRow>) -> Vec<String> {
        rows.into_iter().map(|u| u.username).collect()
    }

    #[test]
    fn follow_then_unfollow() {
        let db = db();
        let a = user(&db, "a");
        let b = user(&db, "b");

        assert!(!db.is_following(a.id, b.id).unwrap());
        assert!(db.follow(a.id, b.id).unwrap());

        assert!(db.is_following(a.id, b.id).unwrap());
        assert!(db.is_followed_by(b.id, a.id).unwrap());
        assert!(!db.is_following(b.id, a.id).unwrap());
        assert_eq!(names(db.followers_of(b.id).unwrap()), ["a"]);
        assert_eq!(names(db.following_of(a.id).unwrap()), ["b"]);
        assert!(db.following_of(b.id).unwrap().is_empty());

        assert!(db.unfollow(a.id, b.id).unwrap());
        assert!(!db.is_following(a.id, b.id).unwrap());
        assert!(!db.is_followed_by(b.id, a.id).unwrap());
        assert!(db.followers_of(b.id).unwrap().is_empty());
    }

    #[test]
    fn repeated_follow_keeps_one_edge() {
        let db = db();
        let a = user(&db, "a");
        let b = user(&db, "b");

        assert!(db.follow(a.id, b.id).unwrap());
        assert!(!db.follow(a.id, b.id).unwrap());
        assert_eq!(db.followers_of(b.id).unwrap().len(), 1);

        // One unfollow is enough to clear it.
        assert!(db.unfollow(a.id, b.id).unwrap());
        assert!(!db.is_following(a.id, b.id).unwrap());
    }

    #[test]
    fn unfollow_without_edge_is_noop() {
        let db = db();
        let a = user(&db, "a");
        let b = user(&db, "b");

        assert!(!db.unfollow(a.id, b.id).unwrap());
        assert!(!db.unfollow(a.id, b.id + 100).unwrap());
    }

    #[test]
    fn follow_rejects_self_and_unknown() {
        let db = db();
        let a = user(&db, "a");

        assert!(matches!(db.follow(a.id, a.id), Err(DbError::SelfFollow)));
        assert!(db.follow(a.id, a.id + 100).unwrap_err().is_not_found());
        assert!(db.following_of(a.id).unwrap().is_empty());
    }

    #[test]
    fn edge_lists_are_sorted_by_username() {
        let db = db();
        let z = user(&db, "zed");
        let m = user(&db, "mia");
        let a = user(&db, "amy");

        db.follow(z.id, m.id).unwrap();
        db.follow(z.id, a.id).unwrap();
        db.follow(m.id, a.id).unwrap();
        db.follow(z.id, a.id).unwrap();

        assert_eq!(names(db.following_of(z.id).unwrap()), ["amy", "mia"]);
        assert_eq!(names(db.followers_of(a.id).unwrap()), ["mia", "zed"]);
    }
}
