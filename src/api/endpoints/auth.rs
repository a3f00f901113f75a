//! Authentication endpoints.
//!
//! `POST /api/auth/signup`: public
//! `POST /api/auth/signin`: public
//! `GET /api/auth/me`: protected
//! `POST /api/auth/signout`: token required, approval not checked

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::endpoints::blocking;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, CallerContext};
use crate::directory::{self, Signup};
use crate::models::{User, UserStatus};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub success: bool,
    pub user: User,
    pub status: UserStatus,
    pub needs_approval: bool,
}

pub async fn signup(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<Signup>,
) -> Result<Json<SignupResponse>, ApiError> {
    let core = ctx.core.clone();
    let registration = blocking(move || directory::register(&core, body)).await?;
    Ok(Json(SignupResponse {
        success: true,
        user: registration.user,
        status: registration.status,
        needs_approval: registration.needs_approval,
    }))
}

#[derive(Deserialize)]
pub struct SigninRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub success: bool,
    pub access_token: String,
    pub user: User,
}

pub async fn signin(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<SigninRequest>,
) -> Result<Json<SigninResponse>, ApiError> {
    let core = ctx.core.clone();
    let signed_in =
        blocking(move || directory::authenticate(&core, &body.email, &body.password)).await?;
    Ok(Json(SigninResponse {
        success: true,
        access_token: signed_in.access_token,
        user: signed_in.user,
    }))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: User,
}

pub async fn me(Extension(caller): Extension<CallerContext>) -> Json<MeResponse> {
    Json(MeResponse {
        user: directory::me(&caller.user),
    })
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub async fn signout(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<SuccessResponse>, ApiError> {
    directory::sign_out(&ctx.core, &caller.user, &caller.token)?;
    Ok(Json(SuccessResponse { success: true }))
}
