//! Access control guard.
//!
//! Pure predicates over (caller, resource, capability). Checked in order:
//! 1. Caller role matches the capability's role → continue
//! 2. Resource owner matches the caller (when the resource has one) → ALLOW
//! 3. Admin override (only for self-or-admin resources) → ALLOW
//! 4. Default → DENY
//!
//! Unauthenticated callers never reach this module: the auth middleware
//! rejects them before any handler runs.

use uuid::Uuid;

use crate::core_state::CoreError;
use crate::models::{Role, User};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Role-gated operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageUsers,
    ViewAuditLog,
    SendRequest,
    AcceptRequest,
    UploadReport,
    ViewReports,
    CreateReview,
}

impl Capability {
    pub fn required_role(self) -> Role {
        match self {
            Self::ManageUsers | Self::ViewAuditLog => Role::Admin,
            Self::SendRequest => Role::Patient,
            Self::AcceptRequest | Self::UploadReport => Role::Assistant,
            Self::ViewReports | Self::CreateReview => Role::Doctor,
        }
    }

    /// Message returned to callers with the wrong role.
    pub fn denial_message(self) -> &'static str {
        match self {
            Self::ManageUsers | Self::ViewAuditLog => "Admin access required",
            Self::SendRequest => "Only patients can send requests",
            Self::AcceptRequest => "Only assistants can accept requests",
            Self::UploadReport => "Only assistants can upload reports",
            Self::ViewReports => "Only doctors can view reports",
            Self::CreateReview => "Only doctors can create reviews",
        }
    }
}

/// Why access was granted (or denied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    RoleMatch,
    Owner,
    AdminOverride,
    WrongRole,
    NotOwner,
}

#[derive(Debug, Clone, Copy)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn allow(reason: AccessReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny(reason: AccessReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Checks
// ═══════════════════════════════════════════════════════════

pub fn check_capability(caller: &User, capability: Capability) -> AccessDecision {
    if caller.role == capability.required_role() {
        AccessDecision::allow(AccessReason::RoleMatch)
    } else {
        AccessDecision::deny(AccessReason::WrongRole)
    }
}

pub fn check_owner(caller: &User, owner_id: &Uuid) -> AccessDecision {
    if &caller.id == owner_id {
        AccessDecision::allow(AccessReason::Owner)
    } else {
        AccessDecision::deny(AccessReason::NotOwner)
    }
}

pub fn check_self_or_admin(caller: &User, user_id: &Uuid) -> AccessDecision {
    if &caller.id == user_id {
        AccessDecision::allow(AccessReason::Owner)
    } else if caller.role == Role::Admin {
        AccessDecision::allow(AccessReason::AdminOverride)
    } else {
        AccessDecision::deny(AccessReason::NotOwner)
    }
}

/// `Forbidden` with the capability's message unless the role matches.
pub fn require_capability(caller: &User, capability: Capability) -> Result<(), CoreError> {
    let decision = check_capability(caller, capability);
    if decision.allowed {
        Ok(())
    } else {
        tracing::debug!(user_id = %caller.id, ?capability, reason = ?decision.reason, "Access denied");
        Err(CoreError::Forbidden(capability.denial_message().into()))
    }
}

pub fn require_owner(caller: &User, owner_id: &Uuid, message: &str) -> Result<(), CoreError> {
    if check_owner(caller, owner_id).allowed {
        Ok(())
    } else {
        tracing::debug!(user_id = %caller.id, owner_id = %owner_id, "Ownership check failed");
        Err(CoreError::Forbidden(message.into()))
    }
}

pub fn require_self_or_admin(caller: &User, user_id: &Uuid) -> Result<(), CoreError> {
    if check_self_or_admin(caller, user_id).allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Not authorized to access this user".into()))
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User::new(
            Uuid::new_v4(),
            format!("{role}@example.com"),
            role.to_string(),
            role,
            chrono::Utc::now(),
        )
    }

    const ALL_ROLES: [Role; 4] = [Role::Patient, Role::Assistant, Role::Doctor, Role::Admin];

    #[test]
    fn only_patients_may_send_requests() {
        for role in ALL_ROLES {
            let allowed = check_capability(&user(role), Capability::SendRequest).allowed;
            assert_eq!(allowed, role == Role::Patient, "role {role}");
        }
    }

    #[test]
    fn admin_capabilities_require_admin() {
        for role in [Role::Patient, Role::Assistant, Role::Doctor] {
            let err = require_capability(&user(role), Capability::ManageUsers).unwrap_err();
            assert!(matches!(err, CoreError::Forbidden(ref m) if m == "Admin access required"));
        }
        assert!(require_capability(&user(Role::Admin), Capability::ViewAuditLog).is_ok());
    }

    #[test]
    fn denial_messages_name_the_role() {
        let err = require_capability(&user(Role::Patient), Capability::CreateReview).unwrap_err();
        assert_eq!(err.to_string(), "Only doctors can create reviews");
    }

    #[test]
    fn owner_check_compares_ids() {
        let caller = user(Role::Patient);
        assert_eq!(check_owner(&caller, &caller.id).reason, AccessReason::Owner);
        let other = Uuid::new_v4();
        assert!(!check_owner(&caller, &other).allowed);
        let err = require_owner(&caller, &other, "Not authorized to cancel this request").unwrap_err();
        assert_eq!(err.to_string(), "Not authorized to cancel this request");
    }

    #[test]
    fn self_or_admin() {
        let patient = user(Role::Patient);
        let admin = user(Role::Admin);
        assert!(check_self_or_admin(&patient, &patient.id).allowed);
        assert_eq!(
            check_self_or_admin(&admin, &patient.id).reason,
            AccessReason::AdminOverride
        );
        assert!(require_self_or_admin(&patient, &admin.id).is_err());
    }
}
