use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::info;

use misfits_types::api::LikeResponse;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::middleware::Session;

/// POST /like_post/{id}: 400 if already liked, 404 if the post is missing.
pub async fn like_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.user_id;
    let likes_count = blocking(&state, move |db| db.like(user_id, post_id)).await?;

    info!("User {} liked post {}", user_id, post_id);
    Ok(Json(LikeResponse {
        message: "Post liked".to_string(),
        likes_count,
    }))
}

/// POST /unlike_post/{id}: 400 if not liked, 404 if the post is missing.
pub async fn unlike_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.user_id;
    let likes_count = blocking(&state, move |db| db.unlike(user_id, post_id)).await?;

    info!("User {} unliked post {}", user_id, post_id);
    Ok(Json(LikeResponse {
        message: "Post unliked".to_string(),
        likes_count,
    }))
}
