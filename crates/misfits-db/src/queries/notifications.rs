use rusqlite::{Connection, Row};

use super::posts::query_post;
use crate::models::{NotificationRow, PostRow};
use crate::{Database, Result};

const NOTIFICATION_COLUMNS: &str = "id, content, user_id, post_id, notification_type, created_at";

impl Database {
    pub fn create_notification(
        &self,
        content: &str,
        user_id: i64,
        post_id: Option<i64>,
        notification_type: Option<&str>,
    ) -> Result<NotificationRow> {
        self.with_tx(|tx| insert_notification(tx, content, user_id, post_id, notification_type))
    }

    /// Notifications for `user_id`, newest first, each paired with its post
    /// when that post still exists.
    pub fn list_notifications(
        &self,
        user_id: i64,
    ) -> Result<Vec<(NotificationRow, Option<PostRow>)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], map_notification)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                let post = match row.post_id {
                    Some(post_id) => query_post(conn, post_id)?,
                    None => None,
                };
                out.push((row, post));
            }
            Ok(out)
        })
    }
}

pub(crate) fn insert_notification(
    conn: &Connection,
    content: &str,
    user_id: i64,
    post_id: Option<i64>,
    notification_type: Option<&str>,
) -> Result<NotificationRow> {
    conn.execute(
        "INSERT INTO notifications (content, user_id, post_id, notification_type) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![content, user_id, post_id, notification_type],
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1"
    ))?;
    Ok(stmt.query_row([conn.last_insert_rowid()], map_notification)?)
}

fn map_notification(row: &Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        content: row.get(1)?,
        user_id: row.get(2)?,
        post_id: row.get(3)?,
        notification_type: row.get(4)?,
        created_at: row.get(5)?,
    })
}
