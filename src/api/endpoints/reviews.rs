//! `POST /api/reviews/create`: doctor review of a pending report.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, CallerContext};
use crate::models::Review;
use crate::reports::{self, NewReview};

#[derive(Serialize)]
pub struct ReviewResponse {
    pub success: bool,
    pub review: Review,
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<NewReview>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let review = reports::create_review(&ctx.core, &caller.user, body)?;
    Ok(Json(ReviewResponse {
        success: true,
        review,
    }))
}
