use rusqlite::{Connection, Row};

use super::users::query_user_by_id;
use crate::models::ChatRow;
use crate::{Database, DbError, Result};

const CHAT_COLUMNS: &str = "id, sender_id, receiver_id, message, created_at";

impl Database {
    /// Store a direct message. The receiver must exist.
    pub fn send_chat(&self, sender_id: i64, receiver_id: i64, message: &str) -> Result<ChatRow> {
        self.with_tx(|tx| {
            if query_user_by_id(tx, receiver_id)?.is_none() {
                return Err(DbError::UserNotFound);
            }

            tx.execute(
                "INSERT INTO chats (sender_id, receiver_id, message) VALUES (?1, ?2, ?3)",
                rusqlite::params![sender_id, receiver_id, message],
            )?;

            query_chat(tx, tx.last_insert_rowid())
        })
    }

    /// Every chat the user sent or received, oldest first.
    pub fn list_chats_for_user(&self, user_id: i64) -> Result<Vec<ChatRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHAT_COLUMNS} FROM chats
                 WHERE sender_id = ?1 OR receiver_id = ?1
                 ORDER BY created_at, id"
            ))?;
            let rows = stmt
                .query_map([user_id], map_chat)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn map_chat(row: &Row<'_>) -> rusqlite::Result<ChatRow> {
    Ok(ChatRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        message: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn query_chat(conn: &Connection, id: i64) -> Result<ChatRow> {
    let mut stmt = conn.prepare(&format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?1"))?;
    Ok(stmt.query_row([id], map_chat)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db, user};

    #[test]
    fn chats_are_visible_to_both_parties() {
        let db = db();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let carol = user(&db, "carol");

        db.send_chat(alice.id, bob.id, "hi bob").unwrap();
        db.send_chat(bob.id, alice.id, "hi alice").unwrap();
        db.send_chat(carol.id, bob.id, "psst").unwrap();

        let alice_view: Vec<String> = db
            .list_chats_for_user(alice.id)
            .unwrap()
            .into_iter()
            .map(|c| c.message)
            .collect();
        assert_eq!(alice_view, vec!["hi bob", "hi alice"]);
        assert_eq!(db.list_chats_for_user(bob.id).unwrap().len(), 3);
    }

    #[test]
    fn missing_receiver_is_rejected() {
        let db = db();
        let alice = user(&db, "alice");

        assert!(matches!(
            db.send_chat(alice.id, alice.id + 7, "anyone?"),
            Err(DbError::UserNotFound)
        ));
        assert!(db.list_chats_for_user(alice.id).unwrap().is_empty());
    }
}
