//! Shared primitives for all Rust crates in Staffguard.

#![forbid(unsafe_code)]

/// Identity claims asserted by the upstream edge layer.
pub mod auth;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use auth::AssertedIdentity;

/// Result type used across Staffguard crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Parses a transport value, rejecting malformed identifiers.
            pub fn parse(value: &str) -> AppResult<Self> {
                Self::from_str(value)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(value.trim()).map(Self).map_err(|error| {
                    AppError::Validation(format!("invalid {} '{value}': {error}", $label))
                })
            }
        }
    };
}

uuid_identifier!(
    /// Tenant identifier used as the partition key for every persisted resource.
    TenantId,
    "tenant id"
);

uuid_identifier!(
    /// Vendor identifier for marketplace-scoped partitions inside a tenant.
    VendorId,
    "vendor id"
);

uuid_identifier!(
    /// Internal staff identifier that permission checks are evaluated against.
    SubjectId,
    "subject id"
);

/// Policy denials that carry a stable machine-readable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenialCode {
    /// Subject lacks the staff-management capability.
    CannotManageStaff,
    /// Subject lacks the role-management capability.
    CannotManageRoles,
    /// Subject lacks the role-delete capability.
    CannotDeleteRoles,
    /// Subjects may not hand out a capability they do not hold.
    CannotGrantCapability,
    /// A role priority may not be raised to the actor's own level.
    PriorityEscalationDenied,
    /// Seeded system roles may not be deleted.
    SystemRoleProtected,
    /// Subject must enroll a second factor first.
    StepUpRequired,
    /// Session has not passed a second-factor check.
    StepUpNotVerified,
    /// Subjects may not grant roles to themselves.
    SelfAssignmentDenied,
    /// Target role is not strictly below the actor's priority.
    PriorityBoundaryExceeded,
    /// Subjects may not remove their own last role.
    CannotRemoveLastRole,
}

impl DenialCode {
    /// Returns the wire code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CannotManageStaff => "CANNOT_MANAGE_STAFF",
            Self::CannotManageRoles => "CANNOT_MANAGE_ROLES",
            Self::CannotDeleteRoles => "CANNOT_DELETE_ROLES",
            Self::CannotGrantCapability => "CANNOT_GRANT_CAPABILITY",
            Self::PriorityEscalationDenied => "PRIORITY_ESCALATION_DENIED",
            Self::SystemRoleProtected => "SYSTEM_ROLE_PROTECTED",
            Self::StepUpRequired => "2FA_REQUIRED",
            Self::StepUpNotVerified => "2FA_NOT_VERIFIED",
            Self::SelfAssignmentDenied => "SELF_ASSIGNMENT_DENIED",
            Self::PriorityBoundaryExceeded => "PRIORITY_BOUNDARY_EXCEEDED",
            Self::CannotRemoveLastRole => "CANNOT_REMOVE_LAST_ROLE",
        }
    }
}

impl Display for DenialCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller identity is missing or cannot be resolved to a subject.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Subject is resolved but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Subject is resolved but lacks one named permission.
    #[error("forbidden: missing permission '{permission}'")]
    PermissionDenied {
        /// Permission the caller would need.
        permission: String,
    },

    /// Subject's highest role priority is below the required threshold.
    #[error("forbidden: role priority {actual} is below required {required}")]
    InsufficientPriority {
        /// Minimum priority required by the operation.
        required: i32,
        /// Highest priority the subject currently holds.
        actual: i32,
    },

    /// Subject is resolved but blocked by a coded policy rule.
    #[error("forbidden ({code}): {message}")]
    PolicyDenied {
        /// Stable denial code.
        code: DenialCode,
        /// Human-readable reason.
        message: String,
    },

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{AppError, DenialCode, NonEmptyString, SubjectId, TenantId};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn tenant_id_formats_as_uuid() {
        let tenant_id = TenantId::new();
        assert_eq!(tenant_id.to_string().len(), 36);
    }

    #[test]
    fn identifiers_roundtrip_through_transport_value() {
        let subject_id = SubjectId::new();
        let parsed = SubjectId::parse(subject_id.to_string().as_str());
        assert!(matches!(parsed, Ok(value) if value == subject_id));
    }

    #[test]
    fn policy_denial_message_includes_code() {
        let error = AppError::PolicyDenied {
            code: DenialCode::StepUpNotVerified,
            message: "verify your second factor".to_owned(),
        };
        assert_eq!(
            error.to_string(),
            "forbidden (2FA_NOT_VERIFIED): verify your second factor"
        );
    }

    #[test]
    fn malformed_identifier_is_a_validation_error() {
        let parsed = TenantId::parse("not-a-uuid");
        assert!(matches!(parsed, Err(AppError::Validation(_))));
    }
}
