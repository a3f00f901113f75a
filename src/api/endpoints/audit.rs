//! `GET /api/audit/logs`: admin view of the audit trail.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::audit;
use crate::models::AuditLogEntry;

#[derive(Serialize)]
pub struct LogsResponse {
    pub logs: Vec<AuditLogEntry>,
}

pub async fn logs(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<LogsResponse>, ApiError> {
    let logs = audit::list_all(&ctx.core, &caller.user)?;
    Ok(Json(LogsResponse { logs }))
}
