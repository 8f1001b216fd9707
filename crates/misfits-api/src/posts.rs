use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, info, warn};

use misfits_types::api::{EditPostRequest, FeedPost, HomeResponse, MessageResponse};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::middleware::Session;
use crate::multipart::Form;
use crate::storage::stored_image_name;
use crate::views::post_view;

/// GET /home: every post, newest first, flagged with whether the viewer
/// has liked it.
pub async fn home(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.user_id;
    let (rows, liked) = blocking(&state, move |db| {
        Ok((db.list_posts()?, db.liked_post_ids(user_id)?))
    })
    .await?;

    let posts = rows
        .into_iter()
        .map(|row| {
            let liked_by_me = liked.contains(&row.id);
            FeedPost {
                post: post_view(row),
                liked_by_me,
            }
        })
        .collect();

    Ok(Json(HomeResponse { posts }))
}

/// POST /create_post: multipart form with `content` and an optional `image`.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = Form::read(multipart).await?;

    let content = form.text("content").unwrap_or_default().trim().to_string();
    if content.is_empty() {
        return Err(ApiError::bad_request("Post content cannot be empty."));
    }

    let image = match form.take_file("image") {
        Some(upload) => {
            let name = stored_image_name(&upload.file_name, upload.data.len())?;
            let stored = state.storage.save(None, &name, &upload.data).await.map_err(|e| {
                error!("Failed to store post image: {}", e);
                ApiError::Internal
            })?;
            Some(stored)
        }
        None => None,
    };

    let author_id = session.user_id;
    let stored = image.clone();
    let result = blocking(&state, move |db| {
        db.create_post(&content, image.as_deref(), author_id)
    })
    .await;
    let row = state.storage.discard_on_error(stored.as_deref(), result).await?;

    info!("User {} created post {}", author_id, row.id);
    Ok((StatusCode::CREATED, Json(post_view(row))))
}

/// POST /edit_post/{id}
pub async fn edit_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(session): Extension<Session>,
    Json(req): Json<EditPostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::bad_request("Post content cannot be empty."));
    }

    let actor_id = session.user_id;
    let row = blocking(&state, move |db| db.update_post(post_id, actor_id, &content))
        .await
        .inspect_err(|e| {
            if matches!(e, ApiError::Forbidden(_)) {
                warn!("User {} tried to edit post {}", actor_id, post_id);
            }
        })?;

    info!("User {} edited post {}", actor_id, post_id);
    Ok(Json(post_view(row)))
}

/// POST /delete_post/{id}: removes the post and its stored image.
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let actor_id = session.user_id;
    let row = blocking(&state, move |db| db.delete_post(post_id, actor_id))
        .await
        .inspect_err(|e| {
            if matches!(e, ApiError::Forbidden(_)) {
                warn!("User {} tried to delete post {}", actor_id, post_id);
            }
        })?;

    if let Some(image) = &row.image {
        // The row is already gone; a leftover file is only logged.
        if let Err(e) = state.storage.delete(image).await {
            error!("Failed to delete image {} of post {}: {}", image, post_id, e);
        }
    }

    info!("User {} deleted post {}", actor_id, post_id);
    Ok(Json(MessageResponse::new("Post deleted successfully!")))
}
