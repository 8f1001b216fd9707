use axum::{Extension, Json, extract::State, response::IntoResponse};

use misfits_types::api::NotificationEntry;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::middleware::Session;
use crate::views::{notification_view, post_view};

/// GET /notifications: newest first, each with its related post if any.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.user_id;
    let rows = blocking(&state, move |db| db.list_notifications(user_id)).await?;

    let entries: Vec<NotificationEntry> = rows
        .into_iter()
        .map(|(notification, post)| NotificationEntry {
            notification: notification_view(notification),
            post: post.map(post_view),
        })
        .collect();

    Ok(Json(entries))
}
