use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use misfits_types::api::{ChatPageResponse, SendMessageRequest};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::middleware::Session;
use crate::views::{chat_view, user_view};

/// GET /chat: the user's conversations plus everyone they could write to.
pub async fn chat_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.user_id;
    let (chats, users) = blocking(&state, move |db| {
        Ok((db.list_chats_for_user(user_id)?, db.list_users_except(user_id)?))
    })
    .await?;

    Ok(Json(ChatPageResponse {
        chats: chats.into_iter().map(chat_view).collect(),
        users: users.into_iter().map(user_view).collect(),
    }))
}

/// POST /send_message
pub async fn send_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::bad_request("Message cannot be empty."));
    }

    let sender_id = session.user_id;
    let receiver_id = req.receiver_id;
    let message = req.message;
    let row = blocking(&state, move |db| db.send_chat(sender_id, receiver_id, &message)).await?;

    info!("User {} messaged user {}", sender_id, receiver_id);
    Ok((StatusCode::CREATED, Json(chat_view(row))))
}
