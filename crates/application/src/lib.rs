//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_service;
mod background_tasks;
mod effective_permission_resolver;
mod permission_cache;
mod rbac_ports;
mod role_admin_service;
mod role_sync_service;

#[cfg(test)]
mod test_support;

pub use authorization_service::{Actor, AuthorizationService, AuthorizationSettings};
pub use background_tasks::BackgroundTasks;
pub use effective_permission_resolver::EffectivePermissionResolver;
pub use permission_cache::{PermissionCache, SubjectScope};
pub use rbac_ports::{
    AssignRoleInput, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    AuditRepository, ClientMetadata, CreateRoleInput, RbacRepository, RemoveRoleAssignmentInput,
    RoleAssignment, RoleDefinition, SubjectDirectory, SubjectRecord, UpdateRoleInput,
};
pub use role_admin_service::{AssignRoleRequest, RoleAdminService};
pub use role_sync_service::{
    ProviderRoleMapping, RoleMappingTable, RoleSyncOutcome, RoleSyncService,
};
