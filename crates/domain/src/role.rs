use serde::{Deserialize, Serialize};

use crate::permission::permissions;

/// Predefined role tiers ordered by authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTier {
    /// Read-only access.
    Viewer,
    /// Regular staff member.
    Member,
    /// Manages a team or department.
    Manager,
    /// Tenant administrator.
    Admin,
    /// Tenant owner.
    Owner,
    /// Platform operator with authority across every tenant tier.
    SuperAdmin,
}

impl RoleTier {
    /// Returns the priority value of this tier.
    #[must_use]
    pub const fn priority(self) -> i32 {
        match self {
            Self::Viewer => 10,
            Self::Member => 20,
            Self::Manager => 30,
            Self::Admin => 40,
            Self::Owner => 50,
            Self::SuperAdmin => 100,
        }
    }

    /// Returns the stable role name seeded for this tier.
    #[must_use]
    pub fn role_name(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Member => "member",
            Self::Manager => "manager",
            Self::Admin => "admin",
            Self::Owner => "owner",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Returns all tiers from least to most authority.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RoleTier] = &[
            RoleTier::Viewer,
            RoleTier::Member,
            RoleTier::Manager,
            RoleTier::Admin,
            RoleTier::Owner,
            RoleTier::SuperAdmin,
        ];

        ALL
    }
}

/// Business capabilities that several permission names can satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Manage other staff members and their role assignments.
    ManageStaff,
    /// Create and edit roles.
    CreateRoles,
    /// Delete roles.
    DeleteRoles,
}

impl Capability {
    /// Returns the permission whose grant implies this capability.
    #[must_use]
    pub fn implied_by(self) -> &'static str {
        match self {
            Self::ManageStaff => permissions::STAFF_UPDATE,
            Self::CreateRoles => permissions::ROLES_CREATE,
            Self::DeleteRoles => permissions::ROLES_DELETE,
        }
    }
}

/// Role definition seeded for every new tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultRoleTemplate {
    /// Tier the template implements.
    pub tier: RoleTier,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Granted permission names.
    pub permissions: Vec<&'static str>,
    /// Capability flags stored on the role.
    pub can_manage_staff: bool,
    /// Role may create roles.
    pub can_create_roles: bool,
    /// Role may delete roles.
    pub can_delete_roles: bool,
}

/// Returns the default role catalog, least authority first.
#[must_use]
pub fn default_role_templates() -> Vec<DefaultRoleTemplate> {
    let viewer = vec![
        permissions::STAFF_READ,
        permissions::DEPARTMENTS_READ,
        permissions::TEAMS_READ,
        permissions::ROLES_READ,
        permissions::PERMISSIONS_READ,
        permissions::DOCUMENTS_READ,
    ];

    let mut member = viewer.clone();
    member.extend([permissions::DOCUMENTS_CREATE, permissions::DOCUMENTS_UPDATE]);

    let mut manager = member.clone();
    manager.extend([
        permissions::STAFF_CREATE,
        permissions::STAFF_UPDATE,
        permissions::DEPARTMENTS_UPDATE,
        "teams:*",
        permissions::ROLES_ASSIGN,
        permissions::INVITATIONS_CREATE,
        permissions::INVITATIONS_READ,
    ]);

    let admin = vec![
        permissions::STAFF_ALL,
        "departments:*",
        "teams:*",
        "roles:*",
        "documents:*",
        "invitations:*",
        permissions::PERMISSIONS_READ,
        permissions::AUDIT_READ,
    ];

    vec![
        DefaultRoleTemplate {
            tier: RoleTier::Viewer,
            display_name: "Viewer",
            permissions: viewer,
            can_manage_staff: false,
            can_create_roles: false,
            can_delete_roles: false,
        },
        DefaultRoleTemplate {
            tier: RoleTier::Member,
            display_name: "Member",
            permissions: member,
            can_manage_staff: false,
            can_create_roles: false,
            can_delete_roles: false,
        },
        DefaultRoleTemplate {
            tier: RoleTier::Manager,
            display_name: "Manager",
            permissions: manager,
            can_manage_staff: true,
            can_create_roles: false,
            can_delete_roles: false,
        },
        DefaultRoleTemplate {
            tier: RoleTier::Admin,
            display_name: "Administrator",
            permissions: admin.clone(),
            can_manage_staff: true,
            can_create_roles: true,
            can_delete_roles: false,
        },
        DefaultRoleTemplate {
            tier: RoleTier::Owner,
            display_name: "Owner",
            permissions: admin.clone(),
            can_manage_staff: true,
            can_create_roles: true,
            can_delete_roles: true,
        },
        DefaultRoleTemplate {
            tier: RoleTier::SuperAdmin,
            display_name: "Super Administrator",
            permissions: admin,
            can_manage_staff: true,
            can_create_roles: true,
            can_delete_roles: true,
        },
    ]
}
