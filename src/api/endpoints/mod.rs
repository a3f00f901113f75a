//! API endpoint handlers.
//!
//! Each module corresponds to one route group. Handlers are thin: they
//! unpack the request, call the domain module and shape the JSON reply.

pub mod assistants;
pub mod audit;
pub mod auth;
pub mod documents;
pub mod health;
pub mod reports;
pub mod requests;
pub mod reviews;
pub mod settings;
pub mod users;

use crate::api::error::ApiError;
use crate::core_state::CoreError;

/// Run a domain call that hashes a password off the async workers.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, CoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task: {e}")))?
        .map_err(ApiError::from)
}
