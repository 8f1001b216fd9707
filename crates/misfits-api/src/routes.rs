use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::auth::{self, AppState};
use crate::error::ApiError;
use crate::middleware::require_session;
use crate::storage::MAX_IMAGE_SIZE;
use crate::{chat, likes, notifications, posts, settings, users};

/// Multipart overhead allowed on top of the image itself.
const FORM_OVERHEAD: usize = 64 * 1024;

/// Every route of the application, ready to be served.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(auth::index))
        .route("/login", get(auth::login_state).post(auth::login))
        .route("/register", post(auth::register));

    let protected_routes = Router::new()
        .route("/logout", get(auth::logout))
        .route("/home", get(posts::home))
        .route("/profile/{user_id}", get(users::profile))
        .route("/edit_profile/{user_id}", post(users::edit_profile))
        .route("/find_friend", get(users::find_friend))
        .route("/send_friend_request/{user_id}", post(users::send_friend_request))
        .route("/notifications", get(notifications::list_notifications))
        .route("/chat", get(chat::chat_page))
        .route("/send_message", post(chat::send_message))
        .route("/create_post", post(posts::create_post))
        .route("/edit_post/{post_id}", post(posts::edit_post))
        .route("/delete_post/{post_id}", post(posts::delete_post))
        .route("/like_post/{post_id}", post(likes::like_post))
        .route("/unlike_post/{post_id}", post(likes::unlike_post))
        .route("/settings", get(settings::get_settings).post(settings::update_settings))
        .route("/change_password", post(auth::change_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/static/uploads", ServeDir::new(state.storage.dir()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + FORM_OVERHEAD))
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
