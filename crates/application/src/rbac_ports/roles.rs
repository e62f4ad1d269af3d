use chrono::{DateTime, Utc};
use staffguard_core::{NonEmptyString, TenantId, VendorId};
use staffguard_domain::{DefaultRoleTemplate, PermissionName};
use uuid::Uuid;

/// Role definition returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Stable role identifier.
    pub role_id: Uuid,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Vendor scope; `None` for tenant-wide roles.
    pub vendor_id: Option<VendorId>,
    /// Unique role name in its scope.
    pub name: String,
    /// Optional display name.
    pub display_name: Option<String>,
    /// Role priority.
    pub priority: i32,
    /// Indicates a seeded system role.
    pub is_system: bool,
    /// Inactive roles contribute nothing and cannot be assigned.
    pub is_active: bool,
    /// Role may manage staff.
    pub can_manage_staff: bool,
    /// Role may create roles.
    pub can_create_roles: bool,
    /// Role may delete roles.
    pub can_delete_roles: bool,
    /// Granted permission names, sorted.
    pub permissions: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input payload for creating roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Vendor scope; `None` for tenant-wide roles.
    pub vendor_id: Option<VendorId>,
    /// Unique role name in its scope.
    pub name: NonEmptyString,
    /// Optional display name.
    pub display_name: Option<String>,
    /// Role priority.
    pub priority: i32,
    /// Marks a seeded system role.
    pub is_system: bool,
    /// Role may manage staff.
    pub can_manage_staff: bool,
    /// Role may create roles.
    pub can_create_roles: bool,
    /// Role may delete roles.
    pub can_delete_roles: bool,
    /// Permission grants.
    pub permissions: Vec<PermissionName>,
}

impl CreateRoleInput {
    /// Builds the input that seeds one default role template.
    pub fn from_template(template: &DefaultRoleTemplate) -> staffguard_core::AppResult<Self> {
        let permissions = template
            .permissions
            .iter()
            .map(|permission| PermissionName::new(*permission))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            vendor_id: None,
            name: NonEmptyString::new(template.tier.role_name())?,
            display_name: Some(template.display_name.to_owned()),
            priority: template.tier.priority(),
            is_system: true,
            can_manage_staff: template.can_manage_staff,
            can_create_roles: template.can_create_roles,
            can_delete_roles: template.can_delete_roles,
            permissions,
        })
    }
}

/// Partial update of a role's attributes. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New display name; an empty string clears it.
    pub display_name: Option<String>,
    /// New priority.
    pub priority: Option<i32>,
    /// Activates or deactivates the role.
    pub is_active: Option<bool>,
    /// New staff-management flag.
    pub can_manage_staff: Option<bool>,
    /// New role-create flag.
    pub can_create_roles: Option<bool>,
    /// New role-delete flag.
    pub can_delete_roles: Option<bool>,
}

impl UpdateRoleInput {
    /// Returns whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
