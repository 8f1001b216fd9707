use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::warn;

use misfits_types::api::Claims;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "misfits_session";

const SESSION_DAYS: i64 = 30;

/// The authenticated user for the current request. Inserted into request
/// extensions by [`require_session`]; handlers take it as
/// `Extension<Session>`.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
}

pub fn create_token(secret: &str, user_id: i64, username: &str) -> jsonwebtoken::errors::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Claims from the session cookie, falling back to `Authorization: Bearer`
/// when the cookie is absent or no longer decodes.
pub fn request_claims(secret: &str, jar: &CookieJar, headers: &HeaderMap) -> Option<Claims> {
    let cookie = jar.get(SESSION_COOKIE).map(|c| c.value());
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    cookie
        .into_iter()
        .chain(bearer)
        .find_map(|token| decode_token(secret, token))
}

/// The request's session, if it carries a valid token for an existing user.
pub async fn current_session(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<Option<Session>, ApiError> {
    let Some(claims) = request_claims(&state.secret, jar, headers) else {
        return Ok(None);
    };

    // The account may have been removed since the token was issued; the
    // username may have changed.
    let user_id = claims.sub;
    let user = blocking(state, move |db| db.get_user_by_id(user_id)).await?;
    if user.is_none() {
        warn!("Session for missing user {}", user_id);
    }

    Ok(user.map(|user| Session {
        user_id: user.id,
        username: user.username,
    }))
}

/// Validate the session token and attach a [`Session`] to the request.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = current_session(&state, &jar, req.headers())
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
