//! Self-service settings.
//!
//! `POST /api/settings/update-profile`, `POST /api/settings/change-password`

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::endpoints::blocking;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, CallerContext};
use crate::directory;
use crate::models::{ProfileUpdate, User};

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: User,
}

pub async fn update_profile(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = directory::update_profile(&ctx.core, &caller.user, body)?;
    Ok(Json(ProfileResponse {
        success: true,
        user,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody {
    #[serde(default)]
    pub new_password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

pub async fn change_password(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<ChangePasswordBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    let core = ctx.core.clone();
    blocking(move || directory::change_password(&core, &caller.user, &body.new_password)).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Password changed successfully",
    }))
}
