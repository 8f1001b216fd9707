use rusqlite::{Connection, Row};

use super::OptionalExt;
use crate::models::PostRow;
use crate::{Database, DbError, Result};

// JOIN users to fetch author username in a single query
const POST_SELECT: &str = "SELECT p.id, p.content, p.image, p.likes_count, p.user_id, u.username, p.created_at
     FROM posts p
     LEFT JOIN users u ON p.user_id = u.id";

impl Database {
    pub fn create_post(&self, content: &str, image: Option<&str>, author_id: i64) -> Result<PostRow> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO posts (content, image, user_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![content, image, author_id],
            )?;
            query_post(tx, tx.last_insert_rowid())?.ok_or(DbError::PostNotFound)
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, id))
    }

    /// The whole feed, newest first.
    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{POST_SELECT} ORDER BY p.created_at DESC, p.id DESC"))?;
            let rows = stmt
                .query_map([], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_posts_by_user(&self, user_id: i64) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{POST_SELECT} WHERE p.user_id = ?1 ORDER BY p.created_at DESC, p.id DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Replace a post's content. Only the author may do this.
    pub fn update_post(&self, post_id: i64, actor_id: i64, content: &str) -> Result<PostRow> {
        self.with_tx(|tx| {
            owned_post(tx, post_id, actor_id)?;
            tx.execute(
                "UPDATE posts SET content = ?2 WHERE id = ?1",
                rusqlite::params![post_id, content],
            )?;
            query_post(tx, post_id)?.ok_or(DbError::PostNotFound)
        })
    }

    /// Delete a post owned by `actor_id`, returning the removed row so the
    /// caller can clean up its image. Likes go with it; notifications stay
    /// with their post reference cleared.
    pub fn delete_post(&self, post_id: i64, actor_id: i64) -> Result<PostRow> {
        self.with_tx(|tx| {
            let post = owned_post(tx, post_id, actor_id)?;
            tx.execute("DELETE FROM posts WHERE id = ?1", [post_id])?;
            Ok(post)
        })
    }
}

fn owned_post(conn: &Connection, post_id: i64, actor_id: i64) -> Result<PostRow> {
    let post = query_post(conn, post_id)?.ok_or(DbError::PostNotFound)?;
    if post.user_id != actor_id {
        return Err(DbError::Unauthorized);
    }
    Ok(post)
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        content: row.get(1)?,
        image: row.get(2)?,
        likes_count: row.get(3)?,
        user_id: row.get(4)?,
        author_username: row
            .get::<_, Option<String>>(5)?
            .unwrap_or_else(|| "unknown".to_string()),
        created_at: row.get(6)?,
    })
}

pub(crate) fn query_post(conn: &Connection, id: i64) -> Result<Option<PostRow>> {
    let mut stmt = conn.prepare(&format!("{POST_SELECT} WHERE p.id = ?1"))?;
    stmt.query_row([id], map_post).optional()
}
