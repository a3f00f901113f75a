//! `GET /api/assistants/search?area=&name=`: approved assistant directory.

use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::directory;
use crate::models::{AssistantSearch, User};

#[derive(Serialize)]
pub struct AssistantsResponse {
    pub assistants: Vec<User>,
}

pub async fn search(
    State(ctx): State<ApiContext>,
    Query(query): Query<AssistantSearch>,
) -> Result<Json<AssistantsResponse>, ApiError> {
    let assistants = directory::search_assistants(&ctx.core, &query)?;
    Ok(Json(AssistantsResponse { assistants }))
}
