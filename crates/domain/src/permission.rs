use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use staffguard_core::AppError;

const WILDCARD_SUFFIX: &str = ":*";

/// Catalog permission names used by the staff service.
pub mod permissions {
    /// Read staff profiles.
    pub const STAFF_READ: &str = "staff:read";
    /// Create staff members.
    pub const STAFF_CREATE: &str = "staff:create";
    /// Update staff members.
    pub const STAFF_UPDATE: &str = "staff:update";
    /// Delete staff members.
    pub const STAFF_DELETE: &str = "staff:delete";
    /// Import staff in bulk.
    pub const STAFF_IMPORT: &str = "staff:import";
    /// Export staff in bulk.
    pub const STAFF_EXPORT: &str = "staff:export";
    /// Every staff action.
    pub const STAFF_ALL: &str = "staff:*";

    /// Read departments.
    pub const DEPARTMENTS_READ: &str = "departments:read";
    /// Create departments.
    pub const DEPARTMENTS_CREATE: &str = "departments:create";
    /// Update departments.
    pub const DEPARTMENTS_UPDATE: &str = "departments:update";
    /// Delete departments.
    pub const DEPARTMENTS_DELETE: &str = "departments:delete";

    /// Read teams.
    pub const TEAMS_READ: &str = "teams:read";
    /// Create teams.
    pub const TEAMS_CREATE: &str = "teams:create";
    /// Update teams.
    pub const TEAMS_UPDATE: &str = "teams:update";
    /// Delete teams.
    pub const TEAMS_DELETE: &str = "teams:delete";

    /// Read roles and assignments.
    pub const ROLES_READ: &str = "roles:read";
    /// Create roles.
    pub const ROLES_CREATE: &str = "roles:create";
    /// Update roles and their grants.
    pub const ROLES_UPDATE: &str = "roles:update";
    /// Delete roles.
    pub const ROLES_DELETE: &str = "roles:delete";
    /// Assign and remove roles.
    pub const ROLES_ASSIGN: &str = "roles:assign";

    /// Read the permission catalog.
    pub const PERMISSIONS_READ: &str = "permissions:read";

    /// Read staff documents.
    pub const DOCUMENTS_READ: &str = "documents:read";
    /// Upload staff documents.
    pub const DOCUMENTS_CREATE: &str = "documents:create";
    /// Update staff documents.
    pub const DOCUMENTS_UPDATE: &str = "documents:update";
    /// Delete staff documents.
    pub const DOCUMENTS_DELETE: &str = "documents:delete";
    /// Verify staff documents.
    pub const DOCUMENTS_VERIFY: &str = "documents:verify";

    /// Read the RBAC audit log.
    pub const AUDIT_READ: &str = "audit:read";

    /// Send staff invitations.
    pub const INVITATIONS_CREATE: &str = "invitations:create";
    /// Read staff invitations.
    pub const INVITATIONS_READ: &str = "invitations:read";
    /// Revoke staff invitations.
    pub const INVITATIONS_REVOKE: &str = "invitations:revoke";
}

/// A validated `resource:action` capability name, optionally ending in `:*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionName(String);

impl PermissionName {
    /// Parses and validates a permission name.
    pub fn new(value: impl Into<String>) -> Result<Self, AppError> {
        let value = value.into();
        let trimmed = value.trim();
        let segments: Vec<&str> = trimmed.split(':').collect();

        if segments.len() < 2 {
            return Err(AppError::Validation(format!(
                "permission '{value}' must have the form 'resource:action'"
            )));
        }

        let last_index = segments.len() - 1;
        for (index, segment) in segments.iter().enumerate() {
            let is_trailing_wildcard = index == last_index && *segment == "*";
            if is_trailing_wildcard {
                continue;
            }

            if segment.is_empty() || !segment.chars().all(is_segment_char) {
                return Err(AppError::Validation(format!(
                    "permission '{value}' has an invalid segment '{segment}'"
                )));
            }
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether this name is a trailing-segment wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0.ends_with(WILDCARD_SUFFIX)
    }

    /// Returns whether holding this permission authorizes `requested`.
    #[must_use]
    pub fn grants(&self, requested: &str) -> bool {
        permission_grants(self.as_str(), requested)
    }
}

impl FromStr for PermissionName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for PermissionName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionName> for String {
    fn from(value: PermissionName) -> Self {
        value.0
    }
}

impl Display for PermissionName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Evaluates one granted permission name against a requested one.
///
/// Exact names match. A granted name ending in `:*` matches any requested name that
/// starts with the same resource prefix followed by a non-empty action. No other
/// pattern form is recognized.
#[must_use]
pub fn permission_grants(granted: &str, requested: &str) -> bool {
    if granted == requested {
        return true;
    }

    let Some(resource) = granted.strip_suffix(WILDCARD_SUFFIX) else {
        return false;
    };

    requested
        .strip_prefix(resource)
        .and_then(|rest| rest.strip_prefix(':'))
        .is_some_and(|action| !action.is_empty())
}

fn is_segment_char(value: char) -> bool {
    value.is_ascii_alphanumeric() || matches!(value, '_' | '-' | '.')
}
