use async_trait::async_trait;
use staffguard_core::{AppResult, SubjectId, TenantId, VendorId};
use staffguard_domain::{PermissionName, RoleGrant};
use uuid::Uuid;

use super::{
    AssignRoleInput, AuditEvent, AuditLogEntry, AuditLogQuery, CreateRoleInput,
    RemoveRoleAssignmentInput, RoleAssignment, RoleDefinition, SubjectRecord, UpdateRoleInput,
};

/// Repository port for roles, grants and assignments.
#[async_trait]
pub trait RbacRepository: Send + Sync {
    /// Lists active assignments of a subject joined with their roles and grants.
    ///
    /// With a vendor the result holds that vendor's assignments and tenant-wide ones;
    /// without a vendor only tenant-wide assignments are returned. The default role of the
    /// subject's team is appended as a grant with `via_team` set, scoped the same way.
    async fn list_role_grants(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
        subject_id: SubjectId,
    ) -> AppResult<Vec<RoleGrant>>;

    /// Lists roles visible in the scope.
    async fn list_roles(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
    ) -> AppResult<Vec<RoleDefinition>>;

    /// Finds a role by identifier.
    async fn find_role(&self, tenant_id: TenantId, role_id: Uuid)
    -> AppResult<Option<RoleDefinition>>;

    /// Finds a role by name, preferring a vendor-scoped role over a tenant-wide one.
    async fn find_role_by_name(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
        name: &str,
    ) -> AppResult<Option<RoleDefinition>>;

    /// Creates a role with its grants.
    async fn create_role(
        &self,
        tenant_id: TenantId,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition>;

    /// Replaces the grants of a role in one transaction.
    async fn set_role_permissions(
        &self,
        tenant_id: TenantId,
        role_id: Uuid,
        permissions: &[PermissionName],
    ) -> AppResult<RoleDefinition>;

    /// Applies a partial update to a role's attributes.
    async fn update_role(
        &self,
        tenant_id: TenantId,
        role_id: Uuid,
        input: &UpdateRoleInput,
    ) -> AppResult<RoleDefinition>;

    /// Soft-deletes a role. Its assignments stop contributing and it can no longer be assigned.
    async fn soft_delete_role(&self, tenant_id: TenantId, role_id: Uuid) -> AppResult<()>;

    /// Sets or clears the default role inherited by every member of a team.
    async fn set_team_default_role(
        &self,
        tenant_id: TenantId,
        team_id: Uuid,
        role_id: Option<Uuid>,
    ) -> AppResult<()>;

    /// Lists every assignment of a subject, including inactive ones.
    async fn list_subject_assignments(
        &self,
        tenant_id: TenantId,
        subject_id: SubjectId,
    ) -> AppResult<Vec<RoleAssignment>>;

    /// Creates an assignment. An active duplicate in the same scope is a conflict.
    async fn assign_role(
        &self,
        tenant_id: TenantId,
        input: AssignRoleInput,
    ) -> AppResult<RoleAssignment>;

    /// Removes an assignment, honoring last-role protection atomically.
    async fn remove_role_assignment(
        &self,
        tenant_id: TenantId,
        input: RemoveRoleAssignmentInput,
    ) -> AppResult<()>;

    /// Marks one assignment primary and clears the others in the same scope.
    async fn set_primary_role(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
        subject_id: SubjectId,
        role_id: Uuid,
    ) -> AppResult<()>;

    /// Marks every expired active assignment inactive and returns the affected count.
    async fn deactivate_expired_assignments(&self) -> AppResult<u64>;
}

/// Directory port for resolving staff subjects.
#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    /// Finds a subject by identity-provider subject identifier.
    async fn find_by_provider_subject(
        &self,
        tenant_id: TenantId,
        provider_subject: &str,
    ) -> AppResult<Option<SubjectRecord>>;

    /// Finds a subject by internal identifier.
    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        subject_id: SubjectId,
    ) -> AppResult<Option<SubjectRecord>>;
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}

/// Repository port for reading tenant audit logs.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists tenant audit entries, newest first.
    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>>;
}
