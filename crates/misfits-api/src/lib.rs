pub mod auth;
pub mod chat;
pub mod error;
pub mod likes;
pub mod middleware;
pub mod multipart;
pub mod notifications;
pub mod posts;
pub mod routes;
pub mod settings;
pub mod storage;
pub mod users;
pub mod views;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use routes::router;

use misfits_db::Database;
use tracing::error;

/// Run a synchronous database call off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> misfits_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
