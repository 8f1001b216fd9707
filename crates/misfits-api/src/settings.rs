use axum::{
    Extension, Json,
    extract::{Multipart, State},
    response::IntoResponse,
};
use tracing::{error, info};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::middleware::Session;
use crate::multipart::Form;
use crate::storage::{PROFILE_PICS, stored_image_name};
use crate::views::user_view;

const MAX_BIO_LEN: usize = 200;

/// GET /settings
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.user_id;
    let user = blocking(&state, move |db| db.get_user_by_id(user_id))
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    Ok(Json(user_view(user)))
}

/// POST /settings: multipart form with `bio` and an optional `profile_pic`.
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = Form::read(multipart).await?;

    let bio = form.text("bio").unwrap_or_default().trim().to_string();
    if bio.chars().count() > MAX_BIO_LEN {
        return Err(ApiError::bad_request(format!(
            "Bio must be at most {MAX_BIO_LEN} characters."
        )));
    }

    let profile_pic = match form.take_file("profile_pic") {
        Some(upload) => {
            let name = stored_image_name(&upload.file_name, upload.data.len())?;
            let stored = state
                .storage
                .save(Some(PROFILE_PICS), &name, &upload.data)
                .await
                .map_err(|e| {
                    error!("Failed to store profile picture: {}", e);
                    ApiError::Internal
                })?;
            Some(stored)
        }
        None => None,
    };

    let user_id = session.user_id;
    let stored = profile_pic.clone();
    let result = blocking(&state, move |db| {
        let old = db.get_user_by_id(user_id)?.and_then(|u| u.profile_pic);
        let row = db.update_settings(user_id, &bio, profile_pic.as_deref())?;
        Ok((old, row))
    })
    .await;
    let (old, row) = state
        .storage
        .discard_on_error(stored.as_deref(), result)
        .await?;
    let replacing = stored.is_some();

    // Drop the replaced picture once the new one is recorded.
    if let Some(old) = old.filter(|_| replacing) {
        if let Err(e) = state.storage.delete(&old).await {
            error!("Failed to delete old profile picture {}: {}", old, e);
        }
    }

    info!("User {} updated settings", user_id);
    Ok(Json(user_view(row)))
}
