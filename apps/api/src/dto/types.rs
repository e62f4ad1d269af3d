use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub postgres: HealthDependencyStatus,
    pub redis: HealthDependencyStatus,
    pub permission_cache: &'static str,
}

/// Status of one backing dependency.
#[derive(Debug, Serialize)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// API representation of a resolved permission set.
#[derive(Debug, Serialize)]
pub struct EffectivePermissionsResponse {
    pub staff_id: Uuid,
    pub tenant_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub roles: Vec<EffectiveRoleResponse>,
    pub permissions: Vec<String>,
    pub max_priority: i32,
    pub can_manage_staff: bool,
    pub can_create_roles: bool,
    pub can_delete_roles: bool,
}

/// Role contributing to a resolved permission set.
#[derive(Debug, Serialize)]
pub struct EffectiveRoleResponse {
    pub role_id: Uuid,
    pub name: String,
    pub priority: i32,
    pub is_primary: bool,
    pub via_team: bool,
}

/// API representation of a role.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub name: String,
    pub display_name: Option<String>,
    pub priority: i32,
    pub is_system: bool,
    pub is_active: bool,
    pub can_manage_staff: bool,
    pub can_create_roles: bool,
    pub can_delete_roles: bool,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Incoming payload for custom role creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub display_name: Option<String>,
    pub priority: i32,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub can_manage_staff: bool,
    #[serde(default)]
    pub can_create_roles: bool,
    #[serde(default)]
    pub can_delete_roles: bool,
}

/// Incoming payload for a partial role update. Absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRoleRequest {
    pub display_name: Option<String>,
    pub priority: Option<i32>,
    pub is_active: Option<bool>,
    pub can_manage_staff: Option<bool>,
    pub can_create_roles: Option<bool>,
    pub can_delete_roles: Option<bool>,
}

/// Incoming payload setting or clearing a team's default role.
#[derive(Debug, Deserialize)]
pub struct SetTeamDefaultRoleRequest {
    pub role_id: Option<Uuid>,
}

/// Incoming payload replacing the grants of a role.
#[derive(Debug, Deserialize)]
pub struct SetRolePermissionsRequest {
    pub permissions: Vec<String>,
}

/// Incoming payload for assigning a role to a staff member.
#[derive(Debug, Deserialize)]
pub struct AssignStaffRoleRequest {
    pub role_id: Uuid,
    #[serde(default)]
    pub is_primary: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// API representation of a role assignment.
#[derive(Debug, Serialize)]
pub struct RoleAssignmentResponse {
    pub assignment_id: Uuid,
    pub staff_id: Uuid,
    pub role_id: Uuid,
    pub role_name: String,
    pub role_priority: i32,
    pub vendor_id: Option<Uuid>,
    pub is_primary: bool,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub assigned_by: Option<Uuid>,
    pub notes: Option<String>,
    pub assigned_at: DateTime<Utc>,
}

/// Query string for the audit log listing.
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQueryParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub action: Option<String>,
    pub actor_id: Option<Uuid>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// API representation of an audit log entry.
#[derive(Debug, Serialize)]
pub struct AuditLogEntryResponse {
    pub event_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub target_staff_id: Option<Uuid>,
    pub detail: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Scope selector for internal lookups.
#[derive(Debug, Deserialize)]
pub struct InternalScopeQuery {
    pub tenant_id: Uuid,
    pub vendor_id: Option<Uuid>,
}

/// Incoming payload for a service-to-service permission check.
#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub tenant_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub staff_id: Uuid,
    pub permission: Option<String>,
    #[serde(default)]
    pub any_of: Vec<String>,
    pub min_priority: Option<i32>,
}

/// Outcome of a service-to-service permission check.
#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub allowed: bool,
    pub max_priority: i32,
}
