//! Verification document endpoints.
//!
//! `POST /api/documents/upload`: multipart field `document`, protected
//! `POST /api/documents/upload-signup`: multipart `document` + `userId`, public
//! `GET /api/documents/:userId`: metadata, self or admin
//! `GET /api/documents/:userId/file`: raw bytes, self or admin

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiPath, CallerContext};
use crate::documents::{self, DocumentUpload};
use crate::models::VerificationDocument;

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub document: VerificationDocument,
}

#[derive(Serialize)]
pub struct DocumentResponse {
    pub document: Option<VerificationDocument>,
}

/// Fields collected from an upload form.
#[derive(Default)]
struct UploadForm {
    document: Option<DocumentUpload>,
    user_id: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "document" => {
                let file_name = field.file_name().unwrap_or("document").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                form.document = Some(DocumentUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "userId" => form.user_id = Some(field.text().await?),
            _ => {}
        }
    }
    Ok(form)
}

fn require_document(form: &mut UploadForm) -> Result<DocumentUpload, ApiError> {
    form.document
        .take()
        .ok_or_else(|| ApiError::BadRequest("No file provided".into()))
}

pub async fn upload(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut form = read_form(multipart).await?;
    let file = require_document(&mut form)?;
    let document = documents::upload(&ctx.core, &caller.user, file)?;
    Ok(Json(UploadResponse {
        success: true,
        document,
    }))
}

/// Staff upload their licence right after signup, before they can sign in.
pub async fn upload_signup(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut form = read_form(multipart).await?;
    let file = require_document(&mut form)?;
    let user_id = form
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("User ID is required".into()))?;
    let user_id = Uuid::parse_str(user_id)
        .map_err(|_| ApiError::NotFound("User not found. Please try signing up again.".into()))?;

    let document = documents::upload_for_signup(&ctx.core, &user_id, file)?;
    Ok(Json(UploadResponse {
        success: true,
        document,
    }))
}

pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document = documents::get(&ctx.core, &caller.user, &user_id)?;
    Ok(Json(DocumentResponse { document }))
}

pub async fn file(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    let file = documents::download(&ctx.core, &caller.user, &user_id)?;
    Ok(([(header::CONTENT_TYPE, file.content_type)], file.bytes).into_response())
}
