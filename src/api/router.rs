//! HTTP API router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Extension(ApiContext) → 2. CORS → 3. Access log → 4. Rate limiter
//! → 5. Auth (protected routes only; signout needs a token but no approval)

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::config::MAX_DOCUMENT_BYTES;
use crate::core_state::CoreState;

/// Multipart framing on top of the largest accepted document.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

/// Build router from a pre-constructed `ApiContext` (custom rate limits).
pub fn api_router_with_ctx(ctx: ApiContext) -> Router {
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/auth/me", get(endpoints::auth::me))
        .route("/users/all", get(endpoints::users::all))
        .route("/users/pending", get(endpoints::users::pending))
        .route("/users/approve", post(endpoints::users::approve))
        .route("/users/reject", post(endpoints::users::reject))
        .route("/assistants/search", get(endpoints::assistants::search))
        .route("/requests/send", post(endpoints::requests::send))
        .route("/requests/my-requests", get(endpoints::requests::my_requests))
        .route(
            "/requests/for-assistant",
            get(endpoints::requests::for_assistant),
        )
        .route("/requests/accept", post(endpoints::requests::accept))
        .route("/requests/cancel", post(endpoints::requests::cancel))
        .route("/reports/upload", post(endpoints::reports::upload))
        .route("/reports/pending", get(endpoints::reports::pending))
        .route("/reports/reviewed", get(endpoints::reports::reviewed))
        .route("/reports/my-uploads", get(endpoints::reports::my_uploads))
        .route("/reports/my-reviews", get(endpoints::reports::my_reviews))
        .route("/reviews/create", post(endpoints::reviews::create))
        .route("/audit/logs", get(endpoints::audit::logs))
        .route("/documents/upload", post(endpoints::documents::upload))
        .route("/documents/:user_id", get(endpoints::documents::get))
        .route("/documents/:user_id/file", get(endpoints::documents::file))
        .route(
            "/settings/update-profile",
            post(endpoints::settings::update_profile),
        )
        .route(
            "/settings/change-password",
            post(endpoints::settings::change_password),
        )
        .with_state(ctx.clone())
        .route_layer(axum::middleware::from_fn(middleware::auth::require_auth));

    let session_only = Router::new()
        .route("/auth/signout", post(endpoints::auth::signout))
        .with_state(ctx.clone())
        .route_layer(axum::middleware::from_fn(middleware::auth::require_session));

    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/signup", post(endpoints::auth::signup))
        .route("/auth/signin", post(endpoints::auth::signin))
        .route(
            "/documents/upload-signup",
            post(endpoints::documents::upload_signup),
        )
        .with_state(ctx.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", protected.merge(session_only).merge(public))
        .layer(DefaultBodyLimit::max(
            MAX_DOCUMENT_BYTES + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::middleware::from_fn(middleware::access_log::log_access))
        .layer(cors)
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx))
}
