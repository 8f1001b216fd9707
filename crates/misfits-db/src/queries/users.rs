use rusqlite::{Connection, Row};

use super::OptionalExt;
use crate::error::is_constraint_violation;
use crate::models::UserRow;
use crate::{Database, DbError, Result};

const USER_COLUMNS: &str = "id, username, email, password, bio, profile_pic, created_at";

impl Database {
    /// Insert a new account. The email must not belong to any existing user.
    pub fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<UserRow> {
        self.with_tx(|tx| {
            if query_user_by_email(tx, email)?.is_some() {
                return Err(DbError::DuplicateEmail);
            }

            tx.execute(
                "INSERT INTO users (username, email, password) VALUES (?1, ?2, ?3)",
                (username, email, password_hash),
            )
            .map_err(duplicate_email)?;

            query_user_by_id(tx, tx.last_insert_rowid())?.ok_or(DbError::UserNotFound)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn list_users_except(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id != ?1 ORDER BY username, id"
            ))?;
            let rows = stmt
                .query_map([user_id], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Case-insensitive substring search on username. LIKE wildcards in
    /// `term` match literally.
    pub fn search_users(&self, term: &str) -> Result<Vec<UserRow>> {
        let pattern = format!("%{}%", escape_like(term));

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username LIKE ?1 ESCAPE '\\' ORDER BY username, id"
            ))?;
            let rows = stmt
                .query_map([&pattern], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_profile(&self, user_id: i64, username: &str, email: &str) -> Result<UserRow> {
        self.with_tx(|tx| {
            if query_user_by_id(tx, user_id)?.is_none() {
                return Err(DbError::UserNotFound);
            }

            let taken: Option<i64> = tx
                .query_row(
                    "SELECT id FROM users WHERE email = ?1 AND id != ?2",
                    (email, user_id),
                    |row| row.get(0),
                )
                .optional()?;
            if taken.is_some() {
                return Err(DbError::DuplicateEmail);
            }

            tx.execute(
                "UPDATE users SET username = ?2, email = ?3 WHERE id = ?1",
                (user_id, username, email),
            )
            .map_err(duplicate_email)?;

            query_user_by_id(tx, user_id)?.ok_or(DbError::UserNotFound)
        })
    }

    pub fn update_password(&self, user_id: i64, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?2 WHERE id = ?1",
                (user_id, password_hash),
            )?;
            if changed == 0 {
                return Err(DbError::UserNotFound);
            }
            Ok(())
        })
    }

    /// Set the bio, and the profile picture when one is given. `None` keeps
    /// the current picture.
    pub fn update_settings(
        &self,
        user_id: i64,
        bio: &str,
        profile_pic: Option<&str>,
    ) -> Result<UserRow> {
        self.with_tx(|tx| {
            let changed = tx.execute(
                "UPDATE users SET bio = ?2, profile_pic = COALESCE(?3, profile_pic) WHERE id = ?1",
                rusqlite::params![user_id, bio, profile_pic],
            )?;
            if changed == 0 {
                return Err(DbError::UserNotFound);
            }
            query_user_by_id(tx, user_id)?.ok_or(DbError::UserNotFound)
        })
    }
}

fn duplicate_email(e: rusqlite::Error) -> DbError {
    if is_constraint_violation(&e) {
        DbError::DuplicateEmail
    } else {
        e.into()
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        bio: row.get(4)?,
        profile_pic: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub(crate) fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))?;
    stmt.query_row([email], map_user).optional()
}

pub(crate) fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
    stmt.query_row([id], map_user).optional()
}
