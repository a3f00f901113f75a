use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Role, UserStatus};

/// Profile record for every account, keyed by the identity-provider id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub status: UserStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Service area, meaningful for assistants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    /// Medical specialization, meaningful for doctors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<Uuid>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    /// Object-store path of the latest verification document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_document: Option<String>,
}

impl User {
    /// Fresh profile at signup. Status follows the role's approval policy.
    pub fn new(id: Uuid, email: String, name: String, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            id,
            email,
            name,
            role,
            status: role.initial_status(),
            phone: None,
            area: None,
            specialization: None,
            created_at: now,
            updated_at: None,
            approved_at: None,
            approved_by: None,
            rejected_at: None,
            rejected_by: None,
            rejection_reason: None,
            verification_document: None,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == UserStatus::Approved
    }
}

/// Self-service profile edit. Missing or blank fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub area: Option<String>,
    pub specialization: Option<String>,
}
