//! HTTP API.
//!
//! Exposes the coordination workflow as JSON endpoints under `/api/`.
//! Protected routes run behind bearer-token auth; every route is
//! rate-limited and access-logged.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::{api_router, api_router_with_ctx};
pub use server::{start_api_server, ApiServer, ApiSession, ServerError};
pub use types::ApiContext;
