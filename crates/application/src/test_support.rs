use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use staffguard_core::{AppError, AppResult, DenialCode, SubjectId, TenantId, VendorId};
use staffguard_domain::{EffectivePermissions, PermissionName, RoleGrant};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    Actor, AssignRoleInput, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    AuditRepository, AuthorizationService, AuthorizationSettings, BackgroundTasks,
    ClientMetadata, CreateRoleInput, EffectivePermissionResolver, PermissionCache,
    RbacRepository, RemoveRoleAssignmentInput, RoleAdminService, RoleAssignment,
    RoleDefinition, RoleMappingTable, RoleSyncService, SubjectDirectory, SubjectRecord,
    SubjectScope, UpdateRoleInput,
};

/// Capability flags for seeded fake roles.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RoleFlags {
    pub can_manage_staff: bool,
    pub can_create_roles: bool,
    pub can_delete_roles: bool,
}

impl RoleFlags {
    pub(crate) fn all() -> Self {
        Self {
            can_manage_staff: true,
            can_create_roles: true,
            can_delete_roles: true,
        }
    }
}

#[derive(Default)]
struct StoreState {
    roles: Vec<RoleDefinition>,
    assignments: Vec<RoleAssignment>,
    subjects: Vec<SubjectRecord>,
    team_default_roles: HashMap<Uuid, Option<Uuid>>,
    team_members: HashMap<SubjectId, Uuid>,
}

#[derive(Default)]
pub(crate) struct FakeRbacStore {
    state: Mutex<StoreState>,
    pub grant_reads: AtomicUsize,
    pub fail_reads: AtomicBool,
}

impl FakeRbacStore {
    pub(crate) async fn add_subject(&self, tenant_id: TenantId, provider_subject: &str) -> SubjectId {
        let subject_id = SubjectId::new();
        self.state.lock().await.subjects.push(SubjectRecord {
            subject_id,
            tenant_id,
            vendor_id: None,
            provider_subject: Some(provider_subject.to_owned()),
            email: format!("{provider_subject}@example.com"),
            is_active: true,
            two_factor_enabled: false,
        });
        subject_id
    }

    pub(crate) async fn add_role(
        &self,
        tenant_id: TenantId,
        name: &str,
        priority: i32,
        permissions: &[&str],
        flags: RoleFlags,
    ) -> Uuid {
        let role_id = Uuid::new_v4();
        self.state.lock().await.roles.push(RoleDefinition {
            role_id,
            tenant_id,
            vendor_id: None,
            name: name.to_owned(),
            display_name: None,
            priority,
            is_system: false,
            is_active: true,
            can_manage_staff: flags.can_manage_staff,
            can_create_roles: flags.can_create_roles,
            can_delete_roles: flags.can_delete_roles,
            permissions: permissions.iter().map(|value| (*value).to_owned()).collect(),
            created_at: Utc::now(),
        });
        role_id
    }

    pub(crate) async fn deactivate_role(&self, role_id: Uuid) {
        for role in &mut self.state.lock().await.roles {
            if role.role_id == role_id {
                role.is_active = false;
            }
        }
    }

    pub(crate) async fn add_team(&self, members: &[SubjectId]) -> Uuid {
        let team_id = Uuid::new_v4();
        let mut state = self.state.lock().await;
        state.team_default_roles.insert(team_id, None);
        for member in members {
            state.team_members.insert(*member, team_id);
        }
        team_id
    }

    pub(crate) async fn grant(
        &self,
        tenant_id: TenantId,
        subject_id: SubjectId,
        role_id: Uuid,
        expires_at: Option<DateTime<Utc>>,
    ) {
        let input = AssignRoleInput {
            subject_id,
            role_id,
            vendor_id: None,
            is_primary: false,
            expires_at,
            assigned_by: None,
            notes: None,
        };
        let _ = self.assign_role(tenant_id, input).await;
    }

    pub(crate) async fn active_role_names(&self, subject_id: SubjectId) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .assignments
            .iter()
            .filter(|assignment| assignment.subject_id == subject_id && assignment.is_active)
            .map(|assignment| assignment.role_name.clone())
            .collect()
    }

    fn in_scope(assignment_vendor: Option<VendorId>, vendor_id: Option<VendorId>) -> bool {
        match vendor_id {
            Some(vendor_id) => assignment_vendor.is_none() || assignment_vendor == Some(vendor_id),
            None => assignment_vendor.is_none(),
        }
    }
}

#[async_trait]
impl RbacRepository for FakeRbacStore {
    async fn list_role_grants(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
        subject_id: SubjectId,
    ) -> AppResult<Vec<RoleGrant>> {
        self.grant_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Internal("store unavailable".to_owned()));
        }

        let state = self.state.lock().await;
        let mut grants: Vec<RoleGrant> = state
            .assignments
            .iter()
            .filter(|assignment| {
                assignment.subject_id == subject_id
                    && assignment.is_active
                    && Self::in_scope(assignment.vendor_id, vendor_id)
            })
            .filter_map(|assignment| {
                state
                    .roles
                    .iter()
                    .find(|role| role.role_id == assignment.role_id && role.tenant_id == tenant_id)
                    .map(|role| RoleGrant {
                        assignment_id: assignment.assignment_id,
                        role_id: role.role_id,
                        role_name: role.name.clone(),
                        priority: role.priority,
                        vendor_id: assignment.vendor_id,
                        assignment_is_active: assignment.is_active,
                        role_is_active: role.is_active,
                        expires_at: assignment.expires_at,
                        is_primary: assignment.is_primary,
                        can_manage_staff: role.can_manage_staff,
                        can_create_roles: role.can_create_roles,
                        can_delete_roles: role.can_delete_roles,
                        permissions: role.permissions.clone(),
                        via_team: false,
                    })
            })
            .collect();

        let team_role = state
            .team_members
            .get(&subject_id)
            .and_then(|team_id| state.team_default_roles.get(team_id).map(|role| (team_id, role)))
            .and_then(|(team_id, role_id)| {
                let role_id = (*role_id)?;
                state
                    .roles
                    .iter()
                    .find(|role| role.role_id == role_id && role.tenant_id == tenant_id)
                    .map(|role| (*team_id, role))
            });
        if let Some((team_id, role)) = team_role {
            grants.push(RoleGrant {
                assignment_id: team_id,
                role_id: role.role_id,
                role_name: role.name.clone(),
                priority: role.priority,
                vendor_id: None,
                assignment_is_active: true,
                role_is_active: role.is_active,
                expires_at: None,
                is_primary: false,
                can_manage_staff: role.can_manage_staff,
                can_create_roles: role.can_create_roles,
                can_delete_roles: role.can_delete_roles,
                permissions: role.permissions.clone(),
                via_team: true,
            });
        }

        Ok(grants)
    }

    async fn list_roles(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
    ) -> AppResult<Vec<RoleDefinition>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .iter()
            .filter(|role| {
                role.tenant_id == tenant_id && Self::in_scope(role.vendor_id, vendor_id)
            })
            .cloned()
            .collect())
    }

    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_id: Uuid,
    ) -> AppResult<Option<RoleDefinition>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .iter()
            .find(|role| role.tenant_id == tenant_id && role.role_id == role_id)
            .cloned())
    }

    async fn find_role_by_name(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
        name: &str,
    ) -> AppResult<Option<RoleDefinition>> {
        let state = self.state.lock().await;
        let mut candidates: Vec<&RoleDefinition> = state
            .roles
            .iter()
            .filter(|role| {
                role.tenant_id == tenant_id
                    && role.name == name
                    && Self::in_scope(role.vendor_id, vendor_id)
            })
            .collect();
        candidates.sort_by_key(|role| role.vendor_id.is_none());
        Ok(candidates.first().map(|role| (*role).clone()))
    }

    async fn create_role(
        &self,
        tenant_id: TenantId,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let mut state = self.state.lock().await;
        if state.roles.iter().any(|role| {
            role.tenant_id == tenant_id
                && role.vendor_id == input.vendor_id
                && role.name == input.name.as_str()
        }) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                input.name.as_str()
            )));
        }

        let mut permissions: Vec<String> = input
            .permissions
            .iter()
            .map(|permission| permission.as_str().to_owned())
            .collect();
        permissions.sort();

        let role = RoleDefinition {
            role_id: Uuid::new_v4(),
            tenant_id,
            vendor_id: input.vendor_id,
            name: input.name.as_str().to_owned(),
            display_name: input.display_name,
            priority: input.priority,
            is_system: input.is_system,
            is_active: true,
            can_manage_staff: input.can_manage_staff,
            can_create_roles: input.can_create_roles,
            can_delete_roles: input.can_delete_roles,
            permissions,
            created_at: Utc::now(),
        };
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn set_role_permissions(
        &self,
        tenant_id: TenantId,
        role_id: Uuid,
        permissions: &[PermissionName],
    ) -> AppResult<RoleDefinition> {
        let mut state = self.state.lock().await;
        let role = state
            .roles
            .iter_mut()
            .find(|role| role.tenant_id == tenant_id && role.role_id == role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;
        role.permissions = permissions
            .iter()
            .map(|permission| permission.as_str().to_owned())
            .collect();
        Ok(role.clone())
    }

    async fn update_role(
        &self,
        tenant_id: TenantId,
        role_id: Uuid,
        input: &UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let mut state = self.state.lock().await;
        let role = state
            .roles
            .iter_mut()
            .find(|role| role.tenant_id == tenant_id && role.role_id == role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        if let Some(display_name) = &input.display_name {
            role.display_name = Some(display_name.clone()).filter(|value| !value.is_empty());
        }
        role.priority = input.priority.unwrap_or(role.priority);
        role.is_active = input.is_active.unwrap_or(role.is_active);
        role.can_manage_staff = input.can_manage_staff.unwrap_or(role.can_manage_staff);
        role.can_create_roles = input.can_create_roles.unwrap_or(role.can_create_roles);
        role.can_delete_roles = input.can_delete_roles.unwrap_or(role.can_delete_roles);
        Ok(role.clone())
    }

    async fn soft_delete_role(&self, tenant_id: TenantId, role_id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let role = state
            .roles
            .iter_mut()
            .find(|role| role.tenant_id == tenant_id && role.role_id == role_id && role.is_active)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;
        role.is_active = false;
        Ok(())
    }

    async fn set_team_default_role(
        &self,
        _tenant_id: TenantId,
        team_id: Uuid,
        role_id: Option<Uuid>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let team = state
            .team_default_roles
            .get_mut(&team_id)
            .ok_or_else(|| AppError::NotFound(format!("team '{team_id}' does not exist")))?;
        *team = role_id;
        Ok(())
    }

    async fn list_subject_assignments(
        &self,
        _tenant_id: TenantId,
        subject_id: SubjectId,
    ) -> AppResult<Vec<RoleAssignment>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Internal("store unavailable".to_owned()));
        }

        Ok(self
            .state
            .lock()
            .await
            .assignments
            .iter()
            .filter(|assignment| assignment.subject_id == subject_id)
            .cloned()
            .collect())
    }

    async fn assign_role(
        &self,
        tenant_id: TenantId,
        input: AssignRoleInput,
    ) -> AppResult<RoleAssignment> {
        let mut state = self.state.lock().await;
        let role = state
            .roles
            .iter()
            .find(|role| role.tenant_id == tenant_id && role.role_id == input.role_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("role '{}' does not exist", input.role_id)))?;

        if state.assignments.iter().any(|assignment| {
            assignment.subject_id == input.subject_id
                && assignment.role_id == input.role_id
                && assignment.vendor_id == input.vendor_id
                && assignment.is_active
        }) {
            return Err(AppError::Conflict(format!(
                "role '{}' is already assigned",
                role.name
            )));
        }

        if input.is_primary {
            for assignment in &mut state.assignments {
                if assignment.subject_id == input.subject_id
                    && assignment.vendor_id == input.vendor_id
                {
                    assignment.is_primary = false;
                }
            }
        }

        let assignment = RoleAssignment {
            assignment_id: Uuid::new_v4(),
            subject_id: input.subject_id,
            role_id: role.role_id,
            role_name: role.name,
            role_priority: role.priority,
            vendor_id: input.vendor_id,
            is_primary: input.is_primary,
            is_active: true,
            expires_at: input.expires_at,
            assigned_by: input.assigned_by,
            notes: input.notes,
            assigned_at: Utc::now(),
        };
        state.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn remove_role_assignment(
        &self,
        _tenant_id: TenantId,
        input: RemoveRoleAssignmentInput,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let in_scope: Vec<usize> = state
            .assignments
            .iter()
            .enumerate()
            .filter(|(_, assignment)| {
                assignment.subject_id == input.subject_id
                    && assignment.vendor_id == input.vendor_id
                    && assignment.is_active
            })
            .map(|(index, _)| index)
            .collect();

        let Some(index) = in_scope
            .iter()
            .copied()
            .find(|index| state.assignments[*index].role_id == input.role_id)
        else {
            return Err(AppError::NotFound("role assignment not found".to_owned()));
        };

        if input.protect_last_role && in_scope.len() <= 1 {
            return Err(AppError::PolicyDenied {
                code: DenialCode::CannotRemoveLastRole,
                message: "cannot remove your last role assignment".to_owned(),
            });
        }

        state.assignments.remove(index);
        Ok(())
    }

    async fn set_primary_role(
        &self,
        _tenant_id: TenantId,
        vendor_id: Option<VendorId>,
        subject_id: SubjectId,
        role_id: Uuid,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.assignments.iter().any(|assignment| {
            assignment.subject_id == subject_id
                && assignment.role_id == role_id
                && assignment.vendor_id == vendor_id
                && assignment.is_active
        }) {
            return Err(AppError::NotFound("role assignment not found".to_owned()));
        }

        for assignment in &mut state.assignments {
            if assignment.subject_id == subject_id && assignment.vendor_id == vendor_id {
                assignment.is_primary = assignment.role_id == role_id && assignment.is_active;
            }
        }
        Ok(())
    }

    async fn deactivate_expired_assignments(&self) -> AppResult<u64> {
        let now = Utc::now();
        let mut count = 0;
        for assignment in &mut self.state.lock().await.assignments {
            if assignment.is_active && assignment.expires_at.is_some_and(|value| value <= now) {
                assignment.is_active = false;
                count += 1;
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl SubjectDirectory for FakeRbacStore {
    async fn find_by_provider_subject(
        &self,
        tenant_id: TenantId,
        provider_subject: &str,
    ) -> AppResult<Option<SubjectRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .subjects
            .iter()
            .find(|subject| {
                subject.tenant_id == tenant_id
                    && subject.provider_subject.as_deref() == Some(provider_subject)
            })
            .cloned())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        subject_id: SubjectId,
    ) -> AppResult<Option<SubjectRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .subjects
            .iter()
            .find(|subject| subject.tenant_id == tenant_id && subject.subject_id == subject_id)
            .cloned())
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for FakeAuditRepository {
    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        Ok(self
            .events
            .lock()
            .await
            .iter()
            .rev()
            .filter(|event| event.tenant_id == tenant_id)
            .filter(|event| query.action.is_none_or(|action| action == event.action))
            .skip(query.offset)
            .take(query.limit)
            .map(|event| AuditLogEntry {
                event_id: Uuid::new_v4(),
                vendor_id: event.vendor_id,
                actor: event.actor,
                action: event.action.as_str().to_owned(),
                entity_type: event.entity_type.clone(),
                entity_id: event.entity_id.clone(),
                target_subject: event.target_subject,
                detail: event.detail.clone(),
                ip_address: event.client.ip_address.clone(),
                user_agent: event.client.user_agent.clone(),
                created_at: Utc::now(),
            })
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct FakePermissionCache {
    pub entries: Mutex<HashMap<SubjectScope, EffectivePermissions>>,
    pub sync_slots: Mutex<HashSet<(TenantId, SubjectId)>>,
    pub fail: AtomicBool,
    pub fail_claims: AtomicBool,
}

#[async_trait]
impl PermissionCache for FakePermissionCache {
    async fn get(&self, scope: &SubjectScope) -> AppResult<Option<EffectivePermissions>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("cache unavailable".to_owned()));
        }
        Ok(self.entries.lock().await.get(scope).cloned())
    }

    async fn set(
        &self,
        scope: &SubjectScope,
        permissions: &EffectivePermissions,
        _ttl_seconds: u32,
    ) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("cache unavailable".to_owned()));
        }
        self.entries
            .lock()
            .await
            .insert(*scope, permissions.clone());
        Ok(())
    }

    async fn invalidate(&self, scope: &SubjectScope) -> AppResult<()> {
        self.entries.lock().await.remove(scope);
        Ok(())
    }

    async fn invalidate_subject(&self, tenant_id: TenantId, subject_id: SubjectId) -> AppResult<()> {
        self.entries
            .lock()
            .await
            .retain(|scope, _| scope.tenant_id != tenant_id || scope.subject_id != subject_id);
        Ok(())
    }

    async fn invalidate_tenant(&self, tenant_id: TenantId) -> AppResult<()> {
        self.entries
            .lock()
            .await
            .retain(|scope, _| scope.tenant_id != tenant_id);
        Ok(())
    }

    async fn claim_sync_slot(
        &self,
        tenant_id: TenantId,
        subject_id: SubjectId,
        _ttl_seconds: u32,
    ) -> AppResult<bool> {
        if self.fail_claims.load(Ordering::SeqCst) {
            return Err(AppError::Internal("cache unavailable".to_owned()));
        }
        Ok(self.sync_slots.lock().await.insert((tenant_id, subject_id)))
    }

    async fn release_sync_slot(&self, tenant_id: TenantId, subject_id: SubjectId) -> AppResult<()> {
        self.sync_slots.lock().await.remove(&(tenant_id, subject_id));
        Ok(())
    }
}

/// Lets detached background tasks run to completion.
pub(crate) async fn settle_background_tasks() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}

/// Services wired against in-memory fakes.
pub(crate) struct Harness {
    pub tenant_id: TenantId,
    pub store: Arc<FakeRbacStore>,
    pub cache: Arc<FakePermissionCache>,
    pub audit: Arc<FakeAuditRepository>,
    pub authorization: AuthorizationService,
    pub admin: RoleAdminService,
    pub sync: RoleSyncService,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let store = Arc::new(FakeRbacStore::default());
        let cache = Arc::new(FakePermissionCache::default());
        let audit = Arc::new(FakeAuditRepository::default());
        let background_tasks = BackgroundTasks::new(Duration::from_secs(5));

        let authorization = AuthorizationService::new(
            EffectivePermissionResolver::new(store.clone()),
            cache.clone(),
            audit.clone(),
            background_tasks,
            AuthorizationSettings::default(),
        );
        let admin = RoleAdminService::new(
            store.clone(),
            store.clone(),
            authorization.clone(),
            audit.clone(),
            audit.clone(),
        );
        let sync = RoleSyncService::new(
            store.clone(),
            authorization.clone(),
            audit.clone(),
            cache.clone(),
            background_tasks,
            RoleMappingTable::default(),
            60,
        );

        Self {
            tenant_id: TenantId::new(),
            store,
            cache,
            audit,
            authorization,
            admin,
            sync,
        }
    }

    pub(crate) fn actor(&self, subject_id: SubjectId) -> Actor {
        Actor::new(self.scope(subject_id), ClientMetadata::default())
    }

    pub(crate) fn scope(&self, subject_id: SubjectId) -> SubjectScope {
        SubjectScope::new(self.tenant_id, None, subject_id)
    }
}
