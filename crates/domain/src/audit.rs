use serde::{Deserialize, Serialize};

/// Actions recorded in the RBAC audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A permission gate denied a request.
    PermissionDenied,
    /// A role was created.
    RoleCreated,
    /// A role's permission grants were replaced.
    RolePermissionsUpdated,
    /// A role's attributes were changed.
    RoleUpdated,
    /// A role was deactivated.
    RoleDeleted,
    /// A team's default role was changed.
    TeamDefaultRoleSet,
    /// A role was assigned to a staff member.
    RoleAssigned,
    /// A role assignment was removed.
    RoleRemoved,
    /// A primary assignment was changed.
    PrimaryRoleSet,
    /// Roles were granted from identity-provider claims.
    RolesSynced,
    /// The default role catalog was seeded for a tenant.
    DefaultRolesSeeded,
}

impl AuditAction {
    /// Returns the stored action value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::RoleCreated => "role_created",
            Self::RolePermissionsUpdated => "role_permissions_updated",
            Self::RoleUpdated => "role_updated",
            Self::RoleDeleted => "role_deleted",
            Self::TeamDefaultRoleSet => "team_default_role_set",
            Self::RoleAssigned => "role_assigned",
            Self::RoleRemoved => "role_removed",
            Self::PrimaryRoleSet => "primary_role_set",
            Self::RolesSynced => "roles_synced",
            Self::DefaultRolesSeeded => "default_roles_seeded",
        }
    }

    /// Parses a stored action value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|action| action.as_str() == value)
    }

    fn all() -> &'static [Self] {
        &[
            Self::PermissionDenied,
            Self::RoleCreated,
            Self::RolePermissionsUpdated,
            Self::RoleUpdated,
            Self::RoleDeleted,
            Self::TeamDefaultRoleSet,
            Self::RoleAssigned,
            Self::RoleRemoved,
            Self::PrimaryRoleSet,
            Self::RolesSynced,
            Self::DefaultRolesSeeded,
        ]
    }
}
