//! Visit reports and doctor reviews.

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::audit;
use crate::authorization::{require_capability, require_owner, Capability};
use crate::core_state::{CoreError, CoreState};
use crate::db;
use crate::models::{
    AuditAction, AuditLogEntry, MedicalData, Report, ReportStatus, RequestStatus, Review, User,
};
use crate::requests::{load_request, save_request};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub report_id: Uuid,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub prescription: Option<String>,
    #[serde(default)]
    pub advice: Option<String>,
}

fn reports_where(
    state: &CoreState,
    keep: impl Fn(&Report) -> bool,
) -> Result<Vec<Report>, CoreError> {
    let mut reports: Vec<Report> = state
        .store()
        .with_conn(db::list_reports)?
        .into_iter()
        .filter(|r| keep(r))
        .collect();
    reports.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
    Ok(reports)
}

fn reviews_where(
    state: &CoreState,
    keep: impl Fn(&Review) -> bool,
) -> Result<Vec<Review>, CoreError> {
    let mut reviews: Vec<Review> = state
        .store()
        .with_conn(db::list_reviews)?
        .into_iter()
        .filter(|r| keep(r))
        .collect();
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(reviews)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ═══════════════════════════════════════════════════════════
// Reports
// ═══════════════════════════════════════════════════════════

/// Record vitals for an accepted visit and complete the request.
///
/// The request update and the report insert are separate writes; a
/// failure between them leaves a completed request without a report.
pub fn upload_report(
    state: &CoreState,
    caller: &User,
    request_id: &Uuid,
    medical_data: MedicalData,
) -> Result<Report, CoreError> {
    require_capability(caller, Capability::UploadReport)?;
    let mut request = load_request(state, request_id)?;
    require_owner(
        caller,
        &request.assistant_id,
        "Not authorized to upload report for this request",
    )?;
    if request.status != RequestStatus::Accepted {
        return Err(CoreError::InvalidTransition(format!(
            "Reports can only be uploaded for accepted requests (request is {})",
            request.status
        )));
    }
    let missing = medical_data.missing_fields();
    if !missing.is_empty() {
        return Err(CoreError::Validation(format!(
            "Missing required medical data: {}",
            missing.join(", ")
        )));
    }

    let now = Utc::now();
    request.status = RequestStatus::Completed;
    request.completed_at = Some(now);
    save_request(state, &request)?;

    let report = Report {
        id: Uuid::new_v4(),
        request_id: request.id,
        patient_id: request.patient_id,
        patient_name: request.patient_name.clone(),
        assistant_id: caller.id,
        assistant_name: caller.name.clone(),
        status: ReportStatus::Pending,
        medical_data,
        uploaded_at: now,
        reviewed_at: None,
        reviewed_by: None,
    };
    state.store().with_conn(|conn| db::put_report(conn, &report))?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::UploadReport, caller.id)
            .target(report.id)
            .meta("requestId", request.id.to_string()),
    );
    tracing::info!(report_id = %report.id, request_id = %request.id, assistant_id = %caller.id, "Report uploaded");
    Ok(report)
}

/// Reports awaiting review. Doctors only.
pub fn list_pending(state: &CoreState, caller: &User) -> Result<Vec<Report>, CoreError> {
    require_capability(caller, Capability::ViewReports)?;
    reports_where(state, |r| r.status == ReportStatus::Pending)
}

/// Reviews written by the calling doctor.
pub fn list_reviewed(state: &CoreState, caller: &User) -> Result<Vec<Review>, CoreError> {
    require_capability(caller, Capability::ViewReports)?;
    reviews_where(state, |r| r.doctor_id == caller.id)
}

pub fn list_my_uploads(state: &CoreState, assistant_id: &Uuid) -> Result<Vec<Report>, CoreError> {
    reports_where(state, |r| &r.assistant_id == assistant_id)
}

// ═══════════════════════════════════════════════════════════
// Reviews
// ═══════════════════════════════════════════════════════════

/// Attach a diagnosis to a pending report and mark it reviewed.
pub fn create_review(state: &CoreState, caller: &User, input: NewReview) -> Result<Review, CoreError> {
    require_capability(caller, Capability::CreateReview)?;
    let diagnosis = input.diagnosis.trim();
    if diagnosis.is_empty() {
        return Err(CoreError::Validation("Diagnosis is required".into()));
    }

    let mut report = state
        .store()
        .with_conn(|conn| db::get_report(conn, &input.report_id))?
        .ok_or_else(|| CoreError::NotFound("Report not found".into()))?;
    if report.status != ReportStatus::Pending {
        return Err(CoreError::InvalidTransition(
            "Report has already been reviewed".into(),
        ));
    }

    let now = Utc::now();
    report.status = ReportStatus::Reviewed;
    report.reviewed_at = Some(now);
    report.reviewed_by = Some(caller.id);
    state.store().with_conn(|conn| db::put_report(conn, &report))?;

    let review = Review {
        id: Uuid::new_v4(),
        report_id: report.id,
        patient_id: report.patient_id,
        patient_name: report.patient_name.clone(),
        doctor_id: caller.id,
        doctor_name: caller.name.clone(),
        diagnosis: diagnosis.to_string(),
        prescription: non_blank(input.prescription),
        advice: non_blank(input.advice),
        created_at: now,
    };
    state.store().with_conn(|conn| db::put_review(conn, &review))?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::CreateReview, caller.id)
            .target(review.id)
            .meta("reportId", report.id.to_string()),
    );
    tracing::info!(review_id = %review.id, report_id = %report.id, doctor_id = %caller.id, "Review created");
    Ok(review)
}

pub fn my_reviews(state: &CoreState, patient_id: &Uuid) -> Result<Vec<Review>, CoreError> {
    reviews_where(state, |r| &r.patient_id == patient_id)
}
