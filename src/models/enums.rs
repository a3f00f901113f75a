use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    Patient => "patient",
    Assistant => "assistant",
    Doctor => "doctor",
    Admin => "admin",
});

impl Role {
    /// Patients are usable immediately; every other role waits for an admin.
    pub fn initial_status(self) -> UserStatus {
        match self {
            Role::Patient => UserStatus::Approved,
            _ => UserStatus::Pending,
        }
    }

    /// Roles whose sign-in is blocked until an admin approves them.
    pub fn requires_approval_to_sign_in(self) -> bool {
        matches!(self, Role::Assistant | Role::Doctor)
    }
}

str_enum!(UserStatus {
    Approved => "approved",
    Pending => "pending",
    Rejected => "rejected",
});

str_enum!(RequestStatus {
    Sent => "sent",
    Accepted => "accepted",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}

str_enum!(ReportStatus {
    Pending => "pending",
    Reviewed => "reviewed",
});

str_enum!(AuditAction {
    Signup => "signup",
    ApproveUser => "approve_user",
    RejectUser => "reject_user",
    SendRequest => "send_request",
    AcceptRequest => "accept_request",
    CancelRequest => "cancel_request",
    UploadReport => "upload_report",
    CreateReview => "create_review",
    UploadDocument => "upload_document",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Patient, Role::Assistant, Role::Doctor, Role::Admin] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_invalid_enum() {
        let err = Role::from_str("nurse").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn only_patients_start_approved() {
        assert_eq!(Role::Patient.initial_status(), UserStatus::Approved);
        assert_eq!(Role::Assistant.initial_status(), UserStatus::Pending);
        assert_eq!(Role::Doctor.initial_status(), UserStatus::Pending);
        assert_eq!(Role::Admin.initial_status(), UserStatus::Pending);
    }

    #[test]
    fn sign_in_gate_covers_clinical_staff_only() {
        assert!(Role::Assistant.requires_approval_to_sign_in());
        assert!(Role::Doctor.requires_approval_to_sign_in());
        assert!(!Role::Patient.requires_approval_to_sign_in());
        assert!(!Role::Admin.requires_approval_to_sign_in());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&AuditAction::ApproveUser).unwrap();
        assert_eq!(json, "\"approve_user\"");
        let status: RequestStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, RequestStatus::Cancelled);
    }

    #[test]
    fn terminal_request_states() {
        assert!(RequestStatus::Completed.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
        assert!(!RequestStatus::Sent.is_terminal());
        assert!(!RequestStatus::Accepted.is_terminal());
    }
}
