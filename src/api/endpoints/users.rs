//! Admin user management.
//!
//! `GET /api/users/all`, `GET /api/users/pending`,
//! `POST /api/users/approve`, `POST /api/users/reject`

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, CallerContext};
use crate::directory;
use crate::models::User;

#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn all(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = directory::list_all(&ctx.core, &caller.user)?;
    Ok(Json(UsersResponse { users }))
}

pub async fn pending(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = directory::list_pending(&ctx.core, &caller.user)?;
    Ok(Json(UsersResponse { users }))
}

pub async fn approve(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<ApproveRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    directory::approve(&ctx.core, &caller.user, &body.user_id)?;
    Ok(Json(MessageResponse {
        success: true,
        message: "User approved",
    }))
}

pub async fn reject(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<RejectRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    directory::reject(&ctx.core, &caller.user, &body.user_id, body.reason)?;
    Ok(Json(MessageResponse {
        success: true,
        message: "User rejected",
    }))
}
