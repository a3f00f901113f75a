//! Report endpoints.
//!
//! `POST /api/reports/upload`, `GET /api/reports/pending`,
//! `GET /api/reports/reviewed`, `GET /api/reports/my-uploads`,
//! `GET /api/reports/my-reviews`

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, CallerContext};
use crate::models::{MedicalData, Report, Review};
use crate::reports;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBody {
    pub request_id: Uuid,
    #[serde(default)]
    pub medical_data: MedicalData,
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub success: bool,
    pub report: Report,
}

#[derive(Serialize)]
pub struct ReportsResponse {
    pub reports: Vec<Report>,
}

#[derive(Serialize)]
pub struct ReviewsResponse {
    pub reviews: Vec<Review>,
}

pub async fn upload(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<UploadBody>,
) -> Result<Json<ReportResponse>, ApiError> {
    let report = reports::upload_report(&ctx.core, &caller.user, &body.request_id, body.medical_data)?;
    Ok(Json(ReportResponse {
        success: true,
        report,
    }))
}

pub async fn pending(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<ReportsResponse>, ApiError> {
    let reports = reports::list_pending(&ctx.core, &caller.user)?;
    Ok(Json(ReportsResponse { reports }))
}

/// Reviews the calling doctor has written.
pub async fn reviewed(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<ReviewsResponse>, ApiError> {
    let reviews = reports::list_reviewed(&ctx.core, &caller.user)?;
    Ok(Json(ReviewsResponse { reviews }))
}

pub async fn my_uploads(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<ReportsResponse>, ApiError> {
    let reports = reports::list_my_uploads(&ctx.core, &caller.user.id)?;
    Ok(Json(ReportsResponse { reports }))
}

pub async fn my_reviews(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<ReviewsResponse>, ApiError> {
    let reviews = reports::my_reviews(&ctx.core, &caller.user.id)?;
    Ok(Json(ReviewsResponse { reviews }))
}
