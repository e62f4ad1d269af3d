use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use staffguard_core::SubjectId;
use uuid::Uuid;

use crate::dto::{
    AssignStaffRoleRequest, AuditLogEntryResponse, AuditLogQueryParams, CreateRoleRequest,
    EffectivePermissionsResponse, RoleAssignmentResponse, RoleResponse,
    SetRolePermissionsRequest, SetTeamDefaultRoleRequest, UpdateRoleRequest,
};
use crate::error::ApiResult;
use crate::middleware::RequestContext;
use crate::state::AppState;

mod assignments;
mod audit;
mod me;
mod roles;
mod teams;

pub use assignments::{
    assign_role_handler, list_staff_roles_handler, remove_role_handler, set_primary_role_handler,
};
pub use audit::list_audit_log_handler;
pub use me::my_permissions_handler;
pub use roles::{
    create_role_handler, delete_role_handler, list_roles_handler, seed_default_roles_handler,
    set_role_permissions_handler, update_role_handler,
};
pub use teams::set_team_default_role_handler;
