//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves it through the
//! identity provider, loads the caller's profile and injects
//! `CallerContext` into request extensions for downstream handlers.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::directory;

/// Caller id copied onto the response so outer layers can log it.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedCaller(pub Uuid);

pub(crate) fn bearer_token<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Require a valid bearer token. Assistants and doctors must also be
/// approved, the same rule sign-in applies.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    authenticate(req, next, true)
        .await
        .unwrap_or_else(|err| err.into_response())
}

/// Require a valid bearer token only. Lets a refused account still end its
/// own session.
pub async fn require_session(req: Request<axum::body::Body>, next: Next) -> Response {
    authenticate(req, next, false)
        .await
        .unwrap_or_else(|err| err.into_response())
}

async fn authenticate(
    mut req: Request<axum::body::Body>,
    next: Next,
    check_status: bool,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = bearer_token(&req).ok_or(ApiError::Unauthorized)?.to_string();

    let user = ctx.core.resolve_caller(&token)?;

    // A token issued before a rejection stops working for gated roles.
    if check_status {
        if let Some(message) = directory::access_refusal(&user) {
            return Err(ApiError::Forbidden(message.into()));
        }
    }

    let caller_id = user.id;
    req.extensions_mut().insert(CallerContext { user, token });

    let mut response = next.run(req).await;
    response
        .extensions_mut()
        .insert(AuthenticatedCaller(caller_id));
    Ok(response)
}
