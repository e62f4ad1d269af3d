use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use staffguard_application::{
    AssignRoleInput, CreateRoleInput, RbacRepository, RemoveRoleAssignmentInput, RoleAssignment,
    RoleDefinition, UpdateRoleInput,
};
use staffguard_core::{AppError, AppResult, DenialCode, SubjectId, TenantId, VendorId};
use staffguard_domain::{PermissionName, RoleGrant};

mod assignments;
mod grants;
mod roles;
mod teams;


/// PostgreSQL-backed repository for roles, grants and assignments.
#[derive(Clone)]
pub struct PostgresRbacRepository {
    pool: PgPool,
}

impl PostgresRbacRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
    }
}

const ROLE_SELECT: &str = r#"
    SELECT
        roles.id AS role_id,
        roles.tenant_id,
        roles.vendor_id,
        roles.name,
        roles.display_name,
        roles.priority,
        roles.is_system,
        roles.is_active,
        roles.can_manage_staff,
        roles.can_create_roles,
        roles.can_delete_roles,
        COALESCE(
            array_agg(grants.permission ORDER BY grants.permission)
                FILTER (WHERE grants.permission IS NOT NULL),
            ARRAY[]::TEXT[]
        ) AS permissions,
        roles.created_at
    FROM staff_roles AS roles
    LEFT JOIN staff_role_permissions AS grants
        ON grants.role_id = roles.id
"#;

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: Uuid,
    tenant_id: Uuid,
    vendor_id: Option<Uuid>,
    name: String,
    display_name: Option<String>,
    priority: i32,
    is_system: bool,
    is_active: bool,
    can_manage_staff: bool,
    can_create_roles: bool,
    can_delete_roles: bool,
    permissions: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<RoleRow> for RoleDefinition {
    fn from(row: RoleRow) -> Self {
        Self {
            role_id: row.role_id,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            vendor_id: row.vendor_id.map(VendorId::from_uuid),
            name: row.name,
            display_name: row.display_name,
            priority: row.priority,
            is_system: row.is_system,
            is_active: row.is_active,
            can_manage_staff: row.can_manage_staff,
            can_create_roles: row.can_create_roles,
            can_delete_roles: row.can_delete_roles,
            permissions: row.permissions,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RoleGrantRow {
    assignment_id: Uuid,
    role_id: Uuid,
    role_name: String,
    priority: i32,
    vendor_id: Option<Uuid>,
    assignment_is_active: bool,
    role_is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    is_primary: bool,
    can_manage_staff: bool,
    can_create_roles: bool,
    can_delete_roles: bool,
    via_team: bool,
    permissions: Vec<String>,
}

impl From<RoleGrantRow> for RoleGrant {
    fn from(row: RoleGrantRow) -> Self {
        Self {
            assignment_id: row.assignment_id,
            role_id: row.role_id,
            role_name: row.role_name,
            priority: row.priority,
            vendor_id: row.vendor_id.map(VendorId::from_uuid),
            assignment_is_active: row.assignment_is_active,
            role_is_active: row.role_is_active,
            expires_at: row.expires_at,
            is_primary: row.is_primary,
            can_manage_staff: row.can_manage_staff,
            can_create_roles: row.can_create_roles,
            can_delete_roles: row.can_delete_roles,
            via_team: row.via_team,
            permissions: row.permissions,
        }
    }
}

#[derive(Debug, FromRow)]
struct RoleAssignmentRow {
    assignment_id: Uuid,
    staff_id: Uuid,
    role_id: Uuid,
    role_name: String,
    role_priority: i32,
    vendor_id: Option<Uuid>,
    is_primary: bool,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    assigned_by: Option<Uuid>,
    notes: Option<String>,
    assigned_at: DateTime<Utc>,
}

impl From<RoleAssignmentRow> for RoleAssignment {
    fn from(row: RoleAssignmentRow) -> Self {
        Self {
            assignment_id: row.assignment_id,
            subject_id: SubjectId::from_uuid(row.staff_id),
            role_id: row.role_id,
            role_name: row.role_name,
            role_priority: row.role_priority,
            vendor_id: row.vendor_id.map(VendorId::from_uuid),
            is_primary: row.is_primary,
            is_active: row.is_active,
            expires_at: row.expires_at,
            assigned_by: row.assigned_by.map(SubjectId::from_uuid),
            notes: row.notes,
            assigned_at: row.assigned_at,
        }
    }
}

#[async_trait]
impl RbacRepository for PostgresRbacRepository {
    async fn list_role_grants(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
        subject_id: SubjectId,
    ) -> AppResult<Vec<RoleGrant>> {
        self.list_role_grants_impl(tenant_id, vendor_id, subject_id)
            .await
    }

    async fn list_roles(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
    ) -> AppResult<Vec<RoleDefinition>> {
        self.list_roles_impl(tenant_id, vendor_id).await
    }

    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_id: Uuid,
    ) -> AppResult<Option<RoleDefinition>> {
        self.find_role_impl(tenant_id, role_id).await
    }

    async fn find_role_by_name(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
        name: &str,
    ) -> AppResult<Option<RoleDefinition>> {
        self.find_role_by_name_impl(tenant_id, vendor_id, name)
            .await
    }

    async fn create_role(
        &self,
        tenant_id: TenantId,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        self.create_role_impl(tenant_id, input).await
    }

    async fn set_role_permissions(
        &self,
        tenant_id: TenantId,
        role_id: Uuid,
        permissions: &[PermissionName],
    ) -> AppResult<RoleDefinition> {
        self.set_role_permissions_impl(tenant_id, role_id, permissions)
            .await
    }

    async fn update_role(
        &self,
        tenant_id: TenantId,
        role_id: Uuid,
        input: &UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        self.update_role_impl(tenant_id, role_id, input).await
    }

    async fn soft_delete_role(&self, tenant_id: TenantId, role_id: Uuid) -> AppResult<()> {
        self.soft_delete_role_impl(tenant_id, role_id).await
    }

    async fn set_team_default_role(
        &self,
        tenant_id: TenantId,
        team_id: Uuid,
        role_id: Option<Uuid>,
    ) -> AppResult<()> {
        self.set_team_default_role_impl(tenant_id, team_id, role_id)
            .await
    }

    async fn list_subject_assignments(
        &self,
        tenant_id: TenantId,
        subject_id: SubjectId,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.list_subject_assignments_impl(tenant_id, subject_id)
            .await
    }

    async fn assign_role(
        &self,
        tenant_id: TenantId,
        input: AssignRoleInput,
    ) -> AppResult<RoleAssignment> {
        self.assign_role_impl(tenant_id, input).await
    }

    async fn remove_role_assignment(
        &self,
        tenant_id: TenantId,
        input: RemoveRoleAssignmentInput,
    ) -> AppResult<()> {
        self.remove_role_assignment_impl(tenant_id, input).await
    }

    async fn set_primary_role(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
        subject_id: SubjectId,
        role_id: Uuid,
    ) -> AppResult<()> {
        self.set_primary_role_impl(tenant_id, vendor_id, subject_id, role_id)
            .await
    }

    async fn deactivate_expired_assignments(&self) -> AppResult<u64> {
        self.deactivate_expired_assignments_impl().await
    }
}

fn map_unique_conflict(error: sqlx::Error, conflict_message: String, context: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(conflict_message);
    }

    AppError::Internal(format!("failed to {context}: {error}"))
}

fn last_role_denied() -> AppError {
    AppError::PolicyDenied {
        code: DenialCode::CannotRemoveLastRole,
        message: "cannot remove your last role assignment".to_owned(),
    }
}

/// Registers permission names in the catalog and grants them to a role.
async fn insert_role_permissions(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: Uuid,
    permissions: &[PermissionName],
) -> AppResult<()> {
    for permission in permissions {
        let (resource, action) = permission
            .as_str()
            .split_once(':')
            .unwrap_or((permission.as_str(), ""));

        sqlx::query(
            r#"
            INSERT INTO staff_permissions (name, resource, action)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(permission.as_str())
        .bind(resource)
        .bind(action)
        .execute(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to register permission '{permission}': {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO staff_role_permissions (role_id, permission)
            VALUES ($1, $2)
            ON CONFLICT (role_id, permission) DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission.as_str())
        .execute(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist role grants: {error}")))?;
    }

    Ok(())
}
