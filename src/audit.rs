//! Append-only audit trail of privileged state changes.

use crate::authorization::{require_capability, Capability};
use crate::core_state::{CoreError, CoreState};
use crate::db;
use crate::models::{AuditLogEntry, User};

/// Append an entry. Best-effort: a store failure is logged and swallowed
/// so the operation being audited still succeeds.
pub fn record(state: &CoreState, entry: AuditLogEntry) {
    let action = entry.action;
    let actor = entry.performed_by;
    if let Err(e) = state
        .store()
        .with_conn(|conn| db::insert_audit_entry(conn, &entry))
    {
        tracing::warn!(%action, %actor, error = %e, "Failed to write audit entry");
    }
}

/// Every entry, newest first. Admin only.
pub fn list_all(state: &CoreState, caller: &User) -> Result<Vec<AuditLogEntry>, CoreError> {
    require_capability(caller, Capability::ViewAuditLog)?;
    Ok(state.store().with_conn(db::list_audit_entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditAction, Role};
    use uuid::Uuid;

    fn admin() -> User {
        User::new(Uuid::new_v4(), "admin@example.com".into(), "Admin".into(), Role::Admin, chrono::Utc::now())
    }

    #[test]
    fn recorded_entries_list_newest_first() {
        let state = CoreState::in_memory().unwrap();
        let admin = admin();
        for action in [AuditAction::Signup, AuditAction::ApproveUser, AuditAction::SendRequest] {
            record(&state, AuditLogEntry::new(action, admin.id));
        }
        let logs = list_all(&state, &admin).unwrap();
        assert_eq!(logs.len(), 3);
        assert!(logs.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn non_admin_cannot_list() {
        let state = CoreState::in_memory().unwrap();
        let mut doctor = admin();
        doctor.role = Role::Doctor;
        assert!(matches!(list_all(&state, &doctor), Err(CoreError::Forbidden(_))));
    }

    #[test]
    fn record_failure_does_not_panic() {
        let state = CoreState::in_memory().unwrap();
        state
            .store()
            .with_conn(|conn| {
                conn.execute_batch("DROP TABLE kv_store")?;
                Ok(())
            })
            .unwrap();
        record(&state, AuditLogEntry::new(AuditAction::Signup, Uuid::new_v4()));
    }
}
