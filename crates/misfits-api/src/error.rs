use std::borrow::Cow;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use misfits_db::DbError;
use misfits_types::api::MessageResponse;

/// Everything a handler can fail with. The display text is what the client
/// sees in the `message` field.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(Cow<'static, str>),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Login required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(Cow<'static, str>),

    #[error("{0}")]
    NotFound(Cow<'static, str>),

    #[error("Email already registered. Please use a different email.")]
    DuplicateEmail,

    #[error("Already liked this post")]
    AlreadyLiked,

    #[error("You haven't liked this post yet")]
    NotLiked,

    #[error("Upload too large")]
    PayloadTooLarge,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::AlreadyLiked | Self::NotLiked => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DuplicateEmail => Self::DuplicateEmail,
            DbError::UserNotFound => Self::not_found("User not found"),
            DbError::PostNotFound => Self::not_found("Post not found"),
            DbError::Unauthorized => {
                Self::forbidden("You are not authorized to modify this resource.")
            }
            DbError::AlreadyLiked => Self::AlreadyLiked,
            DbError::NotLiked => Self::NotLiked,
            other => {
                error!("Database error: {}", other);
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(MessageResponse::new(self.to_string()))).into_response()
    }
}
