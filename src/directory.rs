//! User directory: signup, sign-in, approval, search and self-service settings.
//!
//! Credentials live with the identity provider; this module owns the
//! profile record stored under `user:{id}`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit;
use crate::authorization::{require_capability, Capability};
use crate::core_state::{CoreError, CoreState};
use crate::db;
use crate::models::{
    AssistantSearch, AuditAction, AuditLogEntry, ProfileUpdate, Role, User, UserStatus,
};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct Signup {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub user: User,
    pub status: UserStatus,
    pub needs_approval: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedIn {
    pub access_token: String,
    pub user: User,
}

fn require_non_empty(fields: &[(&str, &str)]) -> Result<(), CoreError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

fn load_user(state: &CoreState, id: &Uuid) -> Result<User, CoreError> {
    state
        .user(id)?
        .ok_or_else(|| CoreError::NotFound("User not found".into()))
}

fn save_user(state: &CoreState, user: &User) -> Result<(), CoreError> {
    Ok(state.store().with_conn(|conn| db::put_user(conn, user))?)
}

fn newest_first(mut users: Vec<User>) -> Vec<User> {
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    users
}

// ═══════════════════════════════════════════════════════════
// Signup / sign-in
// ═══════════════════════════════════════════════════════════

/// Create credentials and a profile. Patients start approved; clinical
/// staff wait for an admin.
pub fn register(state: &CoreState, signup: Signup) -> Result<Registration, CoreError> {
    require_non_empty(&[
        ("email", signup.email.as_str()),
        ("password", signup.password.as_str()),
        ("name", signup.name.as_str()),
    ])?;
    if signup.role == Role::Admin {
        return Err(CoreError::Validation(
            "Admin accounts cannot be created through signup".into(),
        ));
    }

    let email = signup.email.trim().to_lowercase();
    let id = state.identity().create_user(&email, &signup.password)?;
    let user = User::new(id, email, signup.name.trim().to_string(), signup.role, Utc::now());
    save_user(state, &user)?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::Signup, user.id)
            .target(user.id)
            .target_email(user.email.clone())
            .meta("role", user.role.as_str()),
    );
    tracing::info!(user_id = %user.id, role = %user.role, status = %user.status, "User registered");

    Ok(Registration {
        status: user.status,
        needs_approval: user.status == UserStatus::Pending,
        user,
    })
}

/// Why `user` may not use the service, if anything. Only assistants and
/// doctors are held back by their approval status.
pub fn access_refusal(user: &User) -> Option<&'static str> {
    if !user.role.requires_approval_to_sign_in() {
        return None;
    }
    match user.status {
        UserStatus::Approved => None,
        UserStatus::Pending => Some("Your account is pending admin approval"),
        UserStatus::Rejected => Some("Your account has been rejected"),
    }
}

fn discard_session(state: &CoreState, user_id: &Uuid, token: &str) {
    if let Err(e) = state.identity().revoke_token(token) {
        tracing::warn!(user_id = %user_id, error = %e, "Failed to revoke refused session");
    }
}

/// Check credentials and issue a token. Assistants and doctors must be approved.
pub fn authenticate(state: &CoreState, email: &str, password: &str) -> Result<SignedIn, CoreError> {
    let session = state.identity().sign_in(email, password)?;
    let Some(user) = state.user(&session.user_id)? else {
        // The token was issued before the profile lookup; do not leave it usable.
        discard_session(state, &session.user_id, &session.access_token);
        return Err(CoreError::NotFound("User data not found".into()));
    };

    if let Some(message) = access_refusal(&user) {
        discard_session(state, &user.id, &session.access_token);
        tracing::info!(user_id = %user.id, status = %user.status, "Sign-in refused");
        return Err(CoreError::Forbidden(message.into()));
    }

    tracing::debug!(user_id = %user.id, "Signed in");
    Ok(SignedIn {
        access_token: session.access_token,
        user,
    })
}

pub fn me(caller: &User) -> User {
    caller.clone()
}

pub fn sign_out(state: &CoreState, caller: &User, token: &str) -> Result<(), CoreError> {
    state.identity().revoke_token(token)?;
    tracing::debug!(user_id = %caller.id, "Signed out");
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// Admin
// ═══════════════════════════════════════════════════════════

pub fn list_all(state: &CoreState, caller: &User) -> Result<Vec<User>, CoreError> {
    require_capability(caller, Capability::ManageUsers)?;
    let users = state.store().with_conn(db::list_users)?;
    Ok(newest_first(users))
}

pub fn list_pending(state: &CoreState, caller: &User) -> Result<Vec<User>, CoreError> {
    require_capability(caller, Capability::ManageUsers)?;
    let users = state.store().with_conn(db::list_users)?;
    Ok(newest_first(
        users
            .into_iter()
            .filter(|u| u.status == UserStatus::Pending)
            .collect(),
    ))
}

/// Approve any user. Approving again re-stamps and logs again.
pub fn approve(state: &CoreState, caller: &User, user_id: &Uuid) -> Result<User, CoreError> {
    require_capability(caller, Capability::ManageUsers)?;
    let mut user = load_user(state, user_id)?;
    user.status = UserStatus::Approved;
    user.approved_at = Some(Utc::now());
    user.approved_by = Some(caller.id);
    save_user(state, &user)?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::ApproveUser, caller.id)
            .target(user.id)
            .target_email(user.email.clone()),
    );
    tracing::info!(user_id = %user.id, admin_id = %caller.id, "User approved");
    Ok(user)
}

pub fn reject(
    state: &CoreState,
    caller: &User,
    user_id: &Uuid,
    reason: Option<String>,
) -> Result<User, CoreError> {
    require_capability(caller, Capability::ManageUsers)?;
    let reason = reason.filter(|r| !r.trim().is_empty());
    let mut user = load_user(state, user_id)?;
    user.status = UserStatus::Rejected;
    user.rejected_at = Some(Utc::now());
    user.rejected_by = Some(caller.id);
    user.rejection_reason = reason.clone();
    save_user(state, &user)?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::RejectUser, caller.id)
            .target(user.id)
            .target_email(user.email.clone())
            .meta("rejectionReason", reason),
    );
    tracing::info!(user_id = %user.id, admin_id = %caller.id, "User rejected");
    Ok(user)
}

/// Seed an approved admin from configuration. No-op when the email is already registered.
pub fn bootstrap_admin(
    state: &CoreState,
    email: &str,
    password: &str,
    name: &str,
) -> Result<User, CoreError> {
    require_non_empty(&[("email", email), ("password", password), ("name", name)])?;
    let email = email.trim().to_lowercase();

    if let Some(existing) = state
        .store()
        .with_conn(|conn| db::find_user_by_email(conn, &email))?
    {
        if existing.role != Role::Admin {
            tracing::warn!(user_id = %existing.id, role = %existing.role, "Bootstrap admin email belongs to a non-admin account");
        }
        return Ok(existing);
    }

    let id = state.identity().create_user(&email, password)?;
    let now = Utc::now();
    let mut admin = User::new(id, email, name.trim().to_string(), Role::Admin, now);
    admin.status = UserStatus::Approved;
    admin.approved_at = Some(now);
    save_user(state, &admin)?;
    tracing::info!(user_id = %admin.id, "Bootstrap admin created");
    Ok(admin)
}

// ═══════════════════════════════════════════════════════════
// Directory search
// ═══════════════════════════════════════════════════════════

/// Approved assistants matching the optional area/name filters.
pub fn search_assistants(state: &CoreState, search: &AssistantSearch) -> Result<Vec<User>, CoreError> {
    let users = state.store().with_conn(db::list_users)?;
    Ok(users
        .into_iter()
        .filter(|u| u.role == Role::Assistant && u.is_approved())
        .filter(|u| search.matches(u.area.as_deref(), &u.name))
        .collect())
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

/// Blank or missing fields keep their current value. Email cannot change.
pub fn update_profile(state: &CoreState, caller: &User, update: ProfileUpdate) -> Result<User, CoreError> {
    fn pick(new: Option<String>) -> Option<String> {
        new.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    let mut user = load_user(state, &caller.id)?;
    if let Some(name) = pick(update.name) {
        user.name = name;
    }
    if let Some(phone) = pick(update.phone) {
        user.phone = Some(phone);
    }
    if let Some(area) = pick(update.area) {
        user.area = Some(area);
    }
    if let Some(specialization) = pick(update.specialization) {
        user.specialization = Some(specialization);
    }
    user.updated_at = Some(Utc::now());
    save_user(state, &user)?;
    tracing::debug!(user_id = %user.id, "Profile updated");
    Ok(user)
}

/// Replace the caller's credential secret. The old secret is not checked.
pub fn change_password(state: &CoreState, caller: &User, new_password: &str) -> Result<(), CoreError> {
    if new_password.is_empty() {
        return Err(CoreError::Validation("New password is required".into()));
    }
    state.identity().update_password(&caller.id, new_password)?;
    tracing::info!(user_id = %caller.id, "Credential updated");
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin, registered};

    fn signup(email: &str, role: Role) -> Signup {
        Signup {
            email: email.into(),
            password: "pw-123456".into(),
            name: "Someone".into(),
            role,
        }
    }

    #[test]
    fn patient_signup_is_approved_immediately() {
        let state = CoreState::in_memory().unwrap();
        let reg = register(&state, signup("p@example.com", Role::Patient)).unwrap();
        assert_eq!(reg.status, UserStatus::Approved);
        assert!(!reg.needs_approval);
        assert!(authenticate(&state, "p@example.com", "pw-123456").is_ok());
    }

    #[test]
    fn staff_signup_needs_approval() {
        let state = CoreState::in_memory().unwrap();
        for (email, role) in [("a@example.com", Role::Assistant), ("d@example.com", Role::Doctor)] {
            let reg = register(&state, signup(email, role)).unwrap();
            assert_eq!(reg.status, UserStatus::Pending);
            assert!(reg.needs_approval);
        }
    }

    #[test]
    fn missing_fields_are_rejected() {
        let state = CoreState::in_memory().unwrap();
        let mut s = signup("x@example.com", Role::Patient);
        s.name = "  ".into();
        let err = register(&state, s).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ref m) if m.contains("name")));
    }

    #[test]
    fn admin_signup_is_refused() {
        let state = CoreState::in_memory().unwrap();
        let err = register(&state, signup("boss@example.com", Role::Admin)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn duplicate_email_is_validation_error() {
        let state = CoreState::in_memory().unwrap();
        register(&state, signup("dup@example.com", Role::Patient)).unwrap();
        let err = register(&state, signup("DUP@example.com", Role::Doctor)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn pending_and_rejected_staff_cannot_sign_in() {
        let state = CoreState::in_memory().unwrap();
        let admin = admin(&state);
        let reg = register(&state, signup("a@example.com", Role::Assistant)).unwrap();

        let err = authenticate(&state, "a@example.com", "pw-123456").unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(ref m) if m == "Your account is pending admin approval"));

        reject(&state, &admin, &reg.user.id, Some("unverifiable".into())).unwrap();
        let err = authenticate(&state, "a@example.com", "pw-123456").unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(ref m) if m == "Your account has been rejected"));

        approve(&state, &admin, &reg.user.id).unwrap();
        let signed_in = authenticate(&state, "a@example.com", "pw-123456").unwrap();
        assert_eq!(signed_in.user.status, UserStatus::Approved);
        assert_eq!(signed_in.user.approved_by, Some(admin.id));
    }

    #[test]
    fn rejected_patient_keeps_access() {
        let state = CoreState::in_memory().unwrap();
        let admin = admin(&state);
        let reg = register(&state, signup("p@example.com", Role::Patient)).unwrap();
        let rejected = reject(&state, &admin, &reg.user.id, None).unwrap();
        assert_eq!(access_refusal(&rejected), None);
        assert!(authenticate(&state, "p@example.com", "pw-123456").is_ok());
    }

    #[test]
    fn identity_without_profile_leaves_no_session() {
        let state = CoreState::in_memory().unwrap();
        state.identity().create_user("ghost@example.com", "pw-123456").unwrap();

        let err = authenticate(&state, "ghost@example.com", "pw-123456").unwrap_err();
        assert!(matches!(err, CoreError::NotFound(ref m) if m == "User data not found"));
        let sessions: i64 = state
            .store()
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(sessions, 0);
    }

    #[test]
    fn wrong_password_is_rejected() {
        let state = CoreState::in_memory().unwrap();
        register(&state, signup("p@example.com", Role::Patient)).unwrap();
        let err = authenticate(&state, "p@example.com", "nope").unwrap_err();
        assert!(matches!(err, CoreError::Validation(ref m) if m == "Invalid login credentials"));
    }

    #[test]
    fn sign_out_revokes_token() {
        let state = CoreState::in_memory().unwrap();
        let (user, token) = registered(&state, Role::Patient, "Pat");
        sign_out(&state, &user, &token).unwrap();
        assert!(matches!(state.resolve_caller(&token), Err(CoreError::Unauthenticated)));
    }

    #[test]
    fn pending_list_only_has_pending_users_newest_first() {
        let state = CoreState::in_memory().unwrap();
        let admin = admin(&state);
        register(&state, signup("p@example.com", Role::Patient)).unwrap();
        let first = register(&state, signup("a@example.com", Role::Assistant)).unwrap();
        let second = register(&state, signup("d@example.com", Role::Doctor)).unwrap();

        let pending = list_pending(&state, &admin).unwrap();
        let ids: Vec<Uuid> = pending.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![second.user.id, first.user.id]);

        assert_eq!(list_all(&state, &admin).unwrap().len(), 4);
    }

    #[test]
    fn non_admin_cannot_manage_users() {
        let state = CoreState::in_memory().unwrap();
        let (patient, _) = registered(&state, Role::Patient, "Pat");
        assert!(matches!(list_all(&state, &patient), Err(CoreError::Forbidden(_))));
        assert!(matches!(
            approve(&state, &patient, &patient.id),
            Err(CoreError::Forbidden(_))
        ));
    }

    #[test]
    fn approving_unknown_user_is_not_found() {
        let state = CoreState::in_memory().unwrap();
        let admin = admin(&state);
        let err = approve(&state, &admin, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(ref m) if m == "User not found"));
    }

    #[test]
    fn approve_and_reject_are_audited() {
        let state = CoreState::in_memory().unwrap();
        let admin = admin(&state);
        let reg = register(&state, signup("a@example.com", Role::Assistant)).unwrap();
        approve(&state, &admin, &reg.user.id).unwrap();
        approve(&state, &admin, &reg.user.id).unwrap();
        reject(&state, &admin, &reg.user.id, None).unwrap();

        let logs = audit::list_all(&state, &admin).unwrap();
        let count = |action: AuditAction| logs.iter().filter(|l| l.action == action).count();
        assert_eq!(count(AuditAction::Signup), 1);
        assert_eq!(count(AuditAction::ApproveUser), 2);
        assert_eq!(count(AuditAction::RejectUser), 1);
        let rejected = logs.iter().find(|l| l.action == AuditAction::RejectUser).unwrap();
        assert_eq!(rejected.metadata["rejectionReason"], serde_json::Value::Null);
    }

    #[test]
    fn search_returns_only_approved_assistants() {
        let state = CoreState::in_memory().unwrap();
        let (mut north, _) = registered(&state, Role::Assistant, "Ana North");
        north.area = Some("Northside".into());
        save_user(&state, &north).unwrap();
        registered(&state, Role::Assistant, "Bo South");
        registered(&state, Role::Doctor, "Ana Doctor");
        register(&state, signup("pending@example.com", Role::Assistant)).unwrap();

        let all = search_assistants(&state, &AssistantSearch::default()).unwrap();
        assert_eq!(all.len(), 2);

        let by_area = search_assistants(
            &state,
            &AssistantSearch {
                area: Some("NORTH".into()),
                name: None,
            },
        )
        .unwrap();
        assert_eq!(by_area.len(), 1);
        assert_eq!(by_area[0].id, north.id);
    }

    #[test]
    fn update_profile_keeps_blank_fields() {
        let state = CoreState::in_memory().unwrap();
        let (user, _) = registered(&state, Role::Assistant, "Ana");
        let updated = update_profile(
            &state,
            &user,
            ProfileUpdate {
                name: Some("".into()),
                area: Some("Harbor".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.name, "Ana");
        assert_eq!(updated.area.as_deref(), Some("Harbor"));
        assert_eq!(updated.email, user.email);
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn change_password_takes_effect() {
        let state = CoreState::in_memory().unwrap();
        let (user, _) = registered(&state, Role::Patient, "Pat");
        assert!(matches!(
            change_password(&state, &user, ""),
            Err(CoreError::Validation(_))
        ));
        change_password(&state, &user, "brand-new").unwrap();
        assert!(authenticate(&state, &user.email, "brand-new").is_ok());
    }

    #[test]
    fn bootstrap_admin_is_idempotent() {
        let state = CoreState::in_memory().unwrap();
        let first = bootstrap_admin(&state, "Root@Example.com", "pw", "Root").unwrap();
        assert_eq!(first.role, Role::Admin);
        assert!(first.is_approved());
        let second = bootstrap_admin(&state, "root@example.com", "other", "Root").unwrap();
        assert_eq!(first.id, second.id);
        assert!(authenticate(&state, "root@example.com", "pw").is_ok());
    }
}
