use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ReportStatus;

/// Vitals captured during a visit. Free text at this layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicalData {
    pub blood_pressure: String,
    pub blood_sugar: String,
    pub heart_rate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MedicalData {
    /// Names of required readings that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("bloodPressure", &self.blood_pressure),
            ("bloodSugar", &self.blood_sugar),
            ("heartRate", &self.heart_rate),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub request_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub assistant_id: Uuid,
    pub assistant_name: String,
    pub status: ReportStatus,
    pub medical_data: MedicalData,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_lists_blank_required_readings() {
        let data = MedicalData {
            blood_pressure: "120/80".into(),
            blood_sugar: "  ".into(),
            ..Default::default()
        };
        assert_eq!(data.missing_fields(), vec!["bloodSugar", "heartRate"]);
    }

    #[test]
    fn absent_json_fields_deserialize_as_blank() {
        let data: MedicalData = serde_json::from_str(r#"{"bloodPressure":"120/80"}"#).unwrap();
        assert_eq!(data.blood_pressure, "120/80");
        assert!(data.heart_rate.is_empty());
        assert!(data.temperature.is_none());
    }
}
