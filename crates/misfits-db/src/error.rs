use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("user not found")]
    UserNotFound,

    #[error("post not found")]
    PostNotFound,

    /// The acting user does not own the row they tried to change.
    #[error("not authorized to modify this resource")]
    Unauthorized,

    #[error("post already liked")]
    AlreadyLiked,

    #[error("post not liked")]
    NotLiked,

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// True if the error is a UNIQUE/constraint violation raised by SQLite.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
