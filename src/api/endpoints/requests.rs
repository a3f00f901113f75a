//! Visit request endpoints.
//!
//! `POST /api/requests/send`, `GET /api/requests/my-requests`,
//! `GET /api/requests/for-assistant`, `POST /api/requests/accept`,
//! `POST /api/requests/cancel`

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, CallerContext};
use crate::models::ServiceRequest;
use crate::requests;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBody {
    pub assistant_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptBody {
    pub request_id: Uuid,
    #[serde(default)]
    pub scheduled_date: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBody {
    pub request_id: Uuid,
}

#[derive(Serialize)]
pub struct RequestResponse {
    pub success: bool,
    pub request: ServiceRequest,
}

#[derive(Serialize)]
pub struct RequestsResponse {
    pub requests: Vec<ServiceRequest>,
}

pub async fn send(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<SendBody>,
) -> Result<Json<RequestResponse>, ApiError> {
    let request = requests::send(&ctx.core, &caller.user, &body.assistant_id)?;
    Ok(Json(RequestResponse {
        success: true,
        request,
    }))
}

pub async fn my_requests(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<RequestsResponse>, ApiError> {
    let requests = requests::my_requests(&ctx.core, &caller.user.id)?;
    Ok(Json(RequestsResponse { requests }))
}

pub async fn for_assistant(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<RequestsResponse>, ApiError> {
    let requests = requests::for_assistant(&ctx.core, &caller.user.id)?;
    Ok(Json(RequestsResponse { requests }))
}

pub async fn accept(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<AcceptBody>,
) -> Result<Json<RequestResponse>, ApiError> {
    let request = requests::accept(&ctx.core, &caller.user, &body.request_id, &body.scheduled_date)?;
    Ok(Json(RequestResponse {
        success: true,
        request,
    }))
}

pub async fn cancel(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<CancelBody>,
) -> Result<Json<RequestResponse>, ApiError> {
    let request = requests::cancel(&ctx.core, &caller.user, &body.request_id)?;
    Ok(Json(RequestResponse {
        success: true,
        request,
    }))
}
