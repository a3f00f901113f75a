use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata for a user's latest verification document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDocument {
    pub user_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub content_type: String,
    pub file_size: u64,
    pub uploaded_at: DateTime<Utc>,
}
