//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod effective;
mod permission;
mod role;

pub use audit::AuditAction;
pub use effective::{
    EffectivePermissions, EffectiveRole, RoleGrant, resolve_effective_permissions,
};
pub use permission::{PermissionName, permission_grants, permissions};
pub use role::{Capability, DefaultRoleTemplate, RoleTier, default_role_templates};
