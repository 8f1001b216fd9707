use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, warn};

use misfits_db::models::NOTIFICATION_FRIEND_REQUEST;
use misfits_types::api::{EditProfileRequest, MessageResponse, ProfileResponse, SearchResponse};

use crate::auth::{AppState, normalize_email, validate_username};
use crate::blocking;
use crate::error::ApiError;
use crate::middleware::Session;
use crate::views::{post_view, user_view};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
}

/// GET /profile/{user_id}
pub async fn profile(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, posts) = blocking(&state, move |db| {
        let Some(user) = db.get_user_by_id(user_id)? else {
            return Ok((None, Vec::new()));
        };
        Ok((Some(user), db.list_posts_by_user(user_id)?))
    })
    .await?;

    let user = user.ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ProfileResponse {
        can_edit: user.id == session.user_id,
        user: user_view(user),
        posts: posts.into_iter().map(post_view).collect(),
    }))
}

/// POST /edit_profile/{user_id}: a user may only edit their own profile.
pub async fn edit_profile(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Extension(session): Extension<Session>,
    Json(req): Json<EditProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if user_id != session.user_id {
        warn!("User {} tried to edit profile {}", session.user_id, user_id);
        return Err(ApiError::forbidden(
            "You are not authorized to edit this profile.",
        ));
    }

    let username = validate_username(&req.username)?;
    let email = normalize_email(&req.email)?;

    let row = blocking(&state, move |db| db.update_profile(user_id, &username, &email)).await?;

    info!("User {} updated profile", user_id);
    Ok(Json(user_view(row)))
}

/// GET /find_friend?search=term
pub async fn find_friend(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Extension(_session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.search.trim().to_string();
    if term.is_empty() {
        return Ok(Json(SearchResponse { results: vec![] }));
    }

    let rows = blocking(&state, move |db| db.search_users(&term)).await?;

    Ok(Json(SearchResponse {
        results: rows.into_iter().map(user_view).collect(),
    }))
}

/// POST /send_friend_request/{user_id}: notifies the target user.
pub async fn send_friend_request(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    if user_id == session.user_id {
        return Err(ApiError::bad_request(
            "You cannot send a friend request to yourself.",
        ));
    }

    let content = format!("{} sent you a friend request.", session.username);
    blocking(&state, move |db| {
        if db.get_user_by_id(user_id)?.is_none() {
            return Err(misfits_db::DbError::UserNotFound);
        }
        db.create_notification(&content, user_id, None, Some(NOTIFICATION_FRIEND_REQUEST))
    })
    .await?;

    info!("User {} sent a friend request to {}", session.user_id, user_id);
    Ok(Json(MessageResponse::new("Friend request sent!")))
}
