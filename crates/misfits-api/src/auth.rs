use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use rand_core::OsRng;
use tracing::{error, info, warn};

use misfits_db::Database;
use misfits_types::api::{
    ChangePasswordRequest, LoginRequest, LoginResponse, LoginState, MessageResponse,
    RegisterRequest, RegisterResponse,
};

use crate::blocking;
use crate::error::ApiError;
use crate::middleware::{
    Session, create_token, current_session, expired_session_cookie, session_cookie,
};
use crate::storage::Storage;
use crate::views::user_view;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// HS256 key for session tokens.
    pub secret: String,
    pub storage: Storage,
}

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 80;
const MAX_EMAIL_LEN: usize = 120;
const MIN_PASSWORD_LEN: usize = 3;

/// GET /: send the browser wherever its session state says it belongs.
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Redirect, ApiError> {
    let session = current_session(&state, &jar, &headers).await?;

    Ok(if session.is_some() {
        Redirect::to("/home")
    } else {
        Redirect::to("/login")
    })
}

/// GET /login
pub async fn login_state(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<LoginState>, ApiError> {
    let authenticated = current_session(&state, &jar, &headers).await?.is_some();
    Ok(Json(LoginState { authenticated }))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = validate_username(&req.username)?;
    let email = normalize_email(&req.email)?;
    validate_password(&req.password)?;

    let password_hash = hash_password(&req.password)?;

    let user = blocking(&state, move |db| {
        db.create_user(&username, &email, &password_hash)
    })
    .await?;

    info!("Registered user {} ({})", user.id, user.username);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user_view(user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    let user = blocking(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&user.password, &req.password)? {
        warn!("Failed login for user {}", user.id);
        return Err(ApiError::InvalidCredentials);
    }

    let token = create_token(&state.secret, user.id, &user.username).map_err(|e| {
        error!("Failed to sign session token: {}", e);
        ApiError::Internal
    })?;

    info!("User {} logged in", user.id);

    Ok((
        jar.add(session_cookie(token)),
        Json(LoginResponse {
            user_id: user.id,
            username: user.username,
        }),
    ))
}

pub async fn logout(jar: CookieJar, Extension(session): Extension<Session>) -> impl IntoResponse {
    info!("User {} logged out", session.user_id);
    (jar.remove(expired_session_cookie()), Redirect::to("/login"))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.user_id;
    let user = blocking(&state, move |db| db.get_user_by_id(user_id))
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !verify_password(&user.password, &req.current_password)? {
        return Err(ApiError::bad_request("Current password is incorrect."));
    }
    if req.new_password != req.confirm_password {
        return Err(ApiError::bad_request("New passwords do not match."));
    }
    validate_password(&req.new_password)?;

    let password_hash = hash_password(&req.new_password)?;
    blocking(&state, move |db| db.update_password(user_id, &password_hash)).await?;

    info!("User {} changed password", user_id);
    Ok(Json(MessageResponse::new(
        "Your password has been updated successfully.",
    )))
}

// -- Password hashing --

/// Hash with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal
        })
}

pub fn verify_password(hash: &str, password: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!("Stored password hash is malformed: {}", e);
        ApiError::Internal
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// -- Input validation --

pub(crate) fn validate_username(raw: &str) -> Result<String, ApiError> {
    let username = raw.trim();
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(ApiError::bad_request(format!(
            "Username must be between {MIN_USERNAME_LEN} and {MAX_USERNAME_LEN} characters."
        )));
    }
    Ok(username.to_string())
}

/// Trim and lowercase so lookups and the UNIQUE constraint agree.
pub(crate) fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    let valid = email.len() <= MAX_EMAIL_LEN
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid {
        return Err(ApiError::bad_request("Invalid email address."));
    }
    Ok(email)
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("pw1").unwrap();
        assert_ne!(hash, "pw1");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hash, "pw1").unwrap());
        assert!(!verify_password(&hash, "pw2").unwrap());
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(normalize_email("  Alice@X.com ").unwrap(), "alice@x.com");
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@x.com").is_err());
        assert!(normalize_email("alice@").is_err());
    }

    #[test]
    fn username_bounds() {
        assert_eq!(validate_username(" bob ").unwrap(), "bob");
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"x".repeat(81)).is_err());
    }
}
