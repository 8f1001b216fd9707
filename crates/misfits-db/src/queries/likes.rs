use std::collections::HashSet;

use rusqlite::Connection;
use tracing::debug;

use super::OptionalExt;
use super::notifications::insert_notification;
use super::posts::query_post;
use crate::error::is_constraint_violation;
use crate::models::NOTIFICATION_LIKE;
use crate::{Database, DbError, Result};

impl Database {
    /// Record that `user_id` likes `post_id` and notify the author.
    ///
    /// The like row, the counter bump and the notification commit together.
    /// Returns the post's new likes_count.
    pub fn like(&self, user_id: i64, post_id: i64) -> Result<i64> {
        self.with_tx(|tx| {
            let post = query_post(tx, post_id)?.ok_or(DbError::PostNotFound)?;

            let liker: String = tx
                .query_row("SELECT username FROM users WHERE id = ?1", [user_id], |row| {
                    row.get(0)
                })
                .optional()?
                .ok_or(DbError::UserNotFound)?;

            if like_exists(tx, user_id, post_id)? {
                return Err(DbError::AlreadyLiked);
            }

            tx.execute(
                "INSERT INTO likes (user_id, post_id) VALUES (?1, ?2)",
                [user_id, post_id],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    DbError::AlreadyLiked
                } else {
                    e.into()
                }
            })?;

            tx.execute(
                "UPDATE posts SET likes_count = likes_count + 1 WHERE id = ?1",
                [post_id],
            )?;

            insert_notification(
                tx,
                &format!("{liker} liked your post."),
                post.user_id,
                Some(post_id),
                Some(NOTIFICATION_LIKE),
            )?;

            let count = likes_count(tx, post_id)?;
            debug!("user {} liked post {} (now {})", user_id, post_id, count);
            Ok(count)
        })
    }

    /// Withdraw a like. Returns the post's new likes_count.
    pub fn unlike(&self, user_id: i64, post_id: i64) -> Result<i64> {
        self.with_tx(|tx| {
            if query_post(tx, post_id)?.is_none() {
                return Err(DbError::PostNotFound);
            }

            let removed = tx.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2",
                [user_id, post_id],
            )?;
            if removed == 0 {
                return Err(DbError::NotLiked);
            }

            tx.execute(
                "UPDATE posts SET likes_count = likes_count - 1 WHERE id = ?1",
                [post_id],
            )?;

            let count = likes_count(tx, post_id)?;
            debug!("user {} unliked post {} (now {})", user_id, post_id, count);
            Ok(count)
        })
    }

    pub fn has_liked(&self, user_id: i64, post_id: i64) -> Result<bool> {
        self.with_conn(|conn| like_exists(conn, user_id, post_id))
    }

    /// Ids of every post `user_id` currently likes.
    pub fn liked_post_ids(&self, user_id: i64) -> Result<HashSet<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT post_id FROM likes WHERE user_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<HashSet<i64>, _>>()?;
            Ok(ids)
        })
    }
}

fn like_exists(conn: &Connection, user_id: i64, post_id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM likes WHERE user_id = ?1 AND post_id = ?2",
            [user_id, post_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn likes_count(conn: &Connection, post_id: i64) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT likes_count FROM posts WHERE id = ?1",
        [post_id],
        |row| row.get(0),
    )?)
}
