use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A doctor's write-up against one report. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub report_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub diagnosis: String,
    #[serde(default)]
    pub prescription: Option<String>,
    #[serde(default)]
    pub advice: Option<String>,
    pub created_at: DateTime<Utc>,
}
