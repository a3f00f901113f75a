//! Visit request lifecycle.
//!
//! `sent → accepted → completed`, or `sent → cancelled`. Completion happens
//! in `reports::upload_report`. Terminal states have no way out.

use chrono::Utc;
use uuid::Uuid;

use crate::audit;
use crate::authorization::{require_capability, require_owner, Capability};
use crate::core_state::{CoreError, CoreState};
use crate::db;
use crate::models::{AuditAction, AuditLogEntry, RequestStatus, Role, ServiceRequest, User};

pub(crate) fn load_request(state: &CoreState, id: &Uuid) -> Result<ServiceRequest, CoreError> {
    state
        .store()
        .with_conn(|conn| db::get_request(conn, id))?
        .ok_or_else(|| CoreError::NotFound("Request not found".into()))
}

pub(crate) fn save_request(state: &CoreState, request: &ServiceRequest) -> Result<(), CoreError> {
    Ok(state.store().with_conn(|conn| db::put_request(conn, request))?)
}

fn newest_first(
    state: &CoreState,
    keep: impl Fn(&ServiceRequest) -> bool,
) -> Result<Vec<ServiceRequest>, CoreError> {
    let mut requests: Vec<ServiceRequest> = state
        .store()
        .with_conn(db::list_requests)?
        .into_iter()
        .filter(|r| keep(r))
        .collect();
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(requests)
}

/// Patient asks an assistant for a visit.
pub fn send(state: &CoreState, caller: &User, assistant_id: &Uuid) -> Result<ServiceRequest, CoreError> {
    require_capability(caller, Capability::SendRequest)?;
    let assistant = state
        .user(assistant_id)?
        .filter(|u| u.role == Role::Assistant)
        .ok_or_else(|| CoreError::NotFound("Assistant not found".into()))?;

    let request = ServiceRequest {
        id: Uuid::new_v4(),
        patient_id: caller.id,
        patient_name: caller.name.clone(),
        assistant_id: assistant.id,
        assistant_name: assistant.name.clone(),
        status: RequestStatus::Sent,
        created_at: Utc::now(),
        scheduled_date: None,
        accepted_at: None,
        completed_at: None,
        cancelled_at: None,
    };
    save_request(state, &request)?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::SendRequest, caller.id)
            .target(request.id)
            .meta("assistantId", assistant.id.to_string()),
    );
    tracing::info!(request_id = %request.id, patient_id = %caller.id, assistant_id = %assistant.id, "Request sent");
    Ok(request)
}

/// Addressed assistant schedules a `sent` request.
pub fn accept(
    state: &CoreState,
    caller: &User,
    request_id: &Uuid,
    scheduled_date: &str,
) -> Result<ServiceRequest, CoreError> {
    require_capability(caller, Capability::AcceptRequest)?;
    let mut request = load_request(state, request_id)?;
    require_owner(caller, &request.assistant_id, "Not authorized to accept this request")?;

    let scheduled_date = scheduled_date.trim();
    if scheduled_date.is_empty() {
        return Err(CoreError::Validation("Scheduled date is required".into()));
    }
    if request.status != RequestStatus::Sent {
        return Err(CoreError::InvalidTransition(format!(
            "Request is {} and can no longer be accepted",
            request.status
        )));
    }

    request.status = RequestStatus::Accepted;
    request.scheduled_date = Some(scheduled_date.to_string());
    request.accepted_at = Some(Utc::now());
    save_request(state, &request)?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::AcceptRequest, caller.id)
            .target(request.id)
            .meta("scheduledDate", scheduled_date),
    );
    tracing::info!(request_id = %request.id, assistant_id = %caller.id, "Request accepted");
    Ok(request)
}

/// Owning patient withdraws a request the assistant has not yet accepted.
pub fn cancel(state: &CoreState, caller: &User, request_id: &Uuid) -> Result<ServiceRequest, CoreError> {
    let mut request = load_request(state, request_id)?;
    require_owner(caller, &request.patient_id, "Not authorized to cancel this request")?;
    if request.status != RequestStatus::Sent {
        return Err(CoreError::InvalidTransition(format!(
            "Request is {} and can no longer be cancelled",
            request.status
        )));
    }

    request.status = RequestStatus::Cancelled;
    request.cancelled_at = Some(Utc::now());
    save_request(state, &request)?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::CancelRequest, caller.id).target(request.id),
    );
    tracing::info!(request_id = %request.id, patient_id = %caller.id, "Request cancelled");
    Ok(request)
}

pub fn my_requests(state: &CoreState, patient_id: &Uuid) -> Result<Vec<ServiceRequest>, CoreError> {
    newest_first(state, |r| &r.patient_id == patient_id)
}

pub fn for_assistant(state: &CoreState, assistant_id: &Uuid) -> Result<Vec<ServiceRequest>, CoreError> {
    newest_first(state, |r| &r.assistant_id == assistant_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin, registered};

    struct Fixture {
        state: CoreState,
        patient: User,
        assistant: User,
    }

    fn fixture() -> Fixture {
        let state = CoreState::in_memory().unwrap();
        let (patient, _) = registered(&state, Role::Patient, "Pat");
        let (assistant, _) = registered(&state, Role::Assistant, "Ana");
        Fixture {
            state,
            patient,
            assistant,
        }
    }

    #[test]
    fn send_creates_sent_request_with_names() {
        let f = fixture();
        let req = send(&f.state, &f.patient, &f.assistant.id).unwrap();
        assert_eq!(req.status, RequestStatus::Sent);
        assert_eq!(req.patient_name, "Pat");
        assert_eq!(req.assistant_name, "Ana");
        assert_eq!(my_requests(&f.state, &f.patient.id).unwrap(), vec![req.clone()]);
        assert_eq!(for_assistant(&f.state, &f.assistant.id).unwrap(), vec![req]);
    }

    #[test]
    fn only_patients_can_send() {
        let f = fixture();
        let (doctor, _) = registered(&f.state, Role::Doctor, "Doc");
        for caller in [&f.assistant, &doctor, &admin(&f.state)] {
            let err = send(&f.state, caller, &f.assistant.id).unwrap_err();
            assert!(matches!(err, CoreError::Forbidden(ref m) if m == "Only patients can send requests"));
        }
    }

    #[test]
    fn send_to_non_assistant_is_not_found() {
        let f = fixture();
        let (doctor, _) = registered(&f.state, Role::Doctor, "Doc");
        for target in [doctor.id, Uuid::new_v4()] {
            let err = send(&f.state, &f.patient, &target).unwrap_err();
            assert!(matches!(err, CoreError::NotFound(ref m) if m == "Assistant not found"));
        }
    }

    #[test]
    fn only_addressed_assistant_can_accept_once() {
        let f = fixture();
        let (other, _) = registered(&f.state, Role::Assistant, "Other");
        let req = send(&f.state, &f.patient, &f.assistant.id).unwrap();

        let err = accept(&f.state, &other, &req.id, "2025-12-01T10:00").unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(ref m) if m == "Not authorized to accept this request"));

        let (doctor, _) = registered(&f.state, Role::Doctor, "Doc");
        for wrong_role in [&f.patient, &doctor] {
            let err = accept(&f.state, wrong_role, &req.id, "2025-12-01T10:00").unwrap_err();
            assert!(matches!(err, CoreError::Forbidden(ref m) if m == "Only assistants can accept requests"));
        }

        let err = accept(&f.state, &f.assistant, &req.id, " ").unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let accepted = accept(&f.state, &f.assistant, &req.id, "2025-12-01T10:00").unwrap();
        assert_eq!(accepted.status, RequestStatus::Accepted);
        assert_eq!(accepted.scheduled_date.as_deref(), Some("2025-12-01T10:00"));
        assert!(accepted.accepted_at.is_some());

        let err = accept(&f.state, &f.assistant, &req.id, "2025-12-02T10:00").unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition(_)));
    }

    #[test]
    fn accept_unknown_request_is_not_found() {
        let f = fixture();
        let err = accept(&f.state, &f.assistant, &Uuid::new_v4(), "tomorrow").unwrap_err();
        assert!(matches!(err, CoreError::NotFound(ref m) if m == "Request not found"));
    }

    #[test]
    fn cancel_is_owner_only_and_sent_only() {
        let f = fixture();
        let (stranger, _) = registered(&f.state, Role::Patient, "Stranger");
        let req = send(&f.state, &f.patient, &f.assistant.id).unwrap();

        let err = cancel(&f.state, &stranger, &req.id).unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(ref m) if m == "Not authorized to cancel this request"));

        let cancelled = cancel(&f.state, &f.patient, &req.id).unwrap();
        assert_eq!(cancelled.status, RequestStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());

        let err = cancel(&f.state, &f.patient, &req.id).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition(_)));
        let err = accept(&f.state, &f.assistant, &req.id, "2025-12-01").unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition(_)));
    }

    #[test]
    fn accepted_request_cannot_be_cancelled() {
        let f = fixture();
        let req = send(&f.state, &f.patient, &f.assistant.id).unwrap();
        accept(&f.state, &f.assistant, &req.id, "2025-12-01").unwrap();
        let err = cancel(&f.state, &f.patient, &req.id).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition(_)));
    }

    #[test]
    fn lists_are_newest_first() {
        let f = fixture();
        let first = send(&f.state, &f.patient, &f.assistant.id).unwrap();
        let second = send(&f.state, &f.patient, &f.assistant.id).unwrap();
        let ids: Vec<Uuid> = my_requests(&f.state, &f.patient.id)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn lifecycle_actions_are_audited() {
        let f = fixture();
        let req = send(&f.state, &f.patient, &f.assistant.id).unwrap();
        accept(&f.state, &f.assistant, &req.id, "2025-12-01").unwrap();
        let other = send(&f.state, &f.patient, &f.assistant.id).unwrap();
        cancel(&f.state, &f.patient, &other.id).unwrap();

        let logs = audit::list_all(&f.state, &admin(&f.state)).unwrap();
        let count = |action: AuditAction| logs.iter().filter(|l| l.action == action).count();
        assert_eq!(count(AuditAction::SendRequest), 2);
        assert_eq!(count(AuditAction::AcceptRequest), 1);
        assert_eq!(count(AuditAction::CancelRequest), 1);
        assert_eq!(logs[0].action, AuditAction::CancelRequest);
    }
}
