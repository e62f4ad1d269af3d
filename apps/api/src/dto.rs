mod conversions;
mod types;

pub use types::{
    AssignStaffRoleRequest, AuditLogEntryResponse, AuditLogQueryParams, AuthorizeRequest,
    AuthorizeResponse, CreateRoleRequest, EffectivePermissionsResponse, EffectiveRoleResponse,
    HealthDependencyStatus, HealthResponse, InternalScopeQuery, RoleAssignmentResponse,
    RoleResponse, SetRolePermissionsRequest, SetTeamDefaultRoleRequest, UpdateRoleRequest,
};
