use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use sqlx::postgres::PgPoolOptions;
use staffguard_application::{
    AssignRoleInput, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    AuditRepository, AuthorizationService, AuthorizationSettings, BackgroundTasks,
    CreateRoleInput, EffectivePermissionResolver, RbacRepository, RemoveRoleAssignmentInput,
    RoleAdminService, RoleAssignment, RoleDefinition, RoleMappingTable, RoleSyncService,
    SubjectDirectory, SubjectRecord, UpdateRoleInput,
};
use staffguard_core::{AppError, AppResult, SubjectId, TenantId, VendorId};
use staffguard_domain::{PermissionName, RoleGrant};
use staffguard_infrastructure::InMemoryPermissionCache;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::state::AppState;

pub(crate) const INTERNAL_SECRET: &str = "test-internal-secret";

#[derive(Default)]
pub(crate) struct FakeRbacRepository {
    grants: Mutex<HashMap<SubjectId, Vec<RoleGrant>>>,
    /// Makes every grant read fail like an unreachable database.
    pub fail_reads: AtomicBool,
}

impl FakeRbacRepository {
    pub(crate) async fn grant(
        &self,
        subject_id: SubjectId,
        priority: i32,
        permissions: &[&str],
        can_manage_staff: bool,
    ) {
        self.grants
            .lock()
            .await
            .entry(subject_id)
            .or_default()
            .push(RoleGrant {
                assignment_id: Uuid::new_v4(),
                role_id: Uuid::new_v4(),
                role_name: format!("role_{priority}"),
                priority,
                vendor_id: None,
                assignment_is_active: true,
                role_is_active: true,
                expires_at: None,
                is_primary: false,
                can_manage_staff,
                can_create_roles: false,
                can_delete_roles: false,
                via_team: false,
                permissions: permissions.iter().map(|value| (*value).to_owned()).collect(),
            });
    }
}

#[async_trait]
impl RbacRepository for FakeRbacRepository {
    async fn list_role_grants(
        &self,
        _tenant_id: TenantId,
        _vendor_id: Option<VendorId>,
        subject_id: SubjectId,
    ) -> AppResult<Vec<RoleGrant>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Internal("database is unavailable".to_owned()));
        }

        Ok(self
            .grants
            .lock()
            .await
            .get(&subject_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_roles(
        &self,
        _tenant_id: TenantId,
        _vendor_id: Option<VendorId>,
    ) -> AppResult<Vec<RoleDefinition>> {
        Ok(Vec::new())
    }

    async fn find_role(
        &self,
        _tenant_id: TenantId,
        _role_id: Uuid,
    ) -> AppResult<Option<RoleDefinition>> {
        Ok(None)
    }

    async fn find_role_by_name(
        &self,
        _tenant_id: TenantId,
        _vendor_id: Option<VendorId>,
        _name: &str,
    ) -> AppResult<Option<RoleDefinition>> {
        Ok(None)
    }

    async fn create_role(
        &self,
        _tenant_id: TenantId,
        _input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        Err(AppError::Internal("role writes are not faked".to_owned()))
    }

    async fn set_role_permissions(
        &self,
        _tenant_id: TenantId,
        role_id: Uuid,
        _permissions: &[PermissionName],
    ) -> AppResult<RoleDefinition> {
        Err(AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    async fn update_role(
        &self,
        _tenant_id: TenantId,
        role_id: Uuid,
        _input: &UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        Err(AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    async fn soft_delete_role(&self, _tenant_id: TenantId, role_id: Uuid) -> AppResult<()> {
        Err(AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    async fn set_team_default_role(
        &self,
        _tenant_id: TenantId,
        team_id: Uuid,
        _role_id: Option<Uuid>,
    ) -> AppResult<()> {
        Err(AppError::NotFound(format!("team '{team_id}' does not exist")))
    }

    async fn list_subject_assignments(
        &self,
        _tenant_id: TenantId,
        _subject_id: SubjectId,
    ) -> AppResult<Vec<RoleAssignment>> {
        Ok(Vec::new())
    }

    async fn assign_role(
        &self,
        _tenant_id: TenantId,
        _input: AssignRoleInput,
    ) -> AppResult<RoleAssignment> {
        Err(AppError::Internal("assignment writes are not faked".to_owned()))
    }

    async fn remove_role_assignment(
        &self,
        _tenant_id: TenantId,
        _input: RemoveRoleAssignmentInput,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn set_primary_role(
        &self,
        _tenant_id: TenantId,
        _vendor_id: Option<VendorId>,
        _subject_id: SubjectId,
        _role_id: Uuid,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn deactivate_expired_assignments(&self) -> AppResult<u64> {
        Ok(0)
    }
}

#[derive(Default)]
pub(crate) struct FakeSubjectDirectory {
    subjects: Mutex<Vec<SubjectRecord>>,
}

#[async_trait]
impl SubjectDirectory for FakeSubjectDirectory {
    async fn find_by_provider_subject(
        &self,
        tenant_id: TenantId,
        provider_subject: &str,
    ) -> AppResult<Option<SubjectRecord>> {
        Ok(self
            .subjects
            .lock()
            .await
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
            .subjects
            .lock()
            .await
            .iter()
            .find(|subject| subject.tenant_id == tenant_id && subject.subject_id == subject_id)
            .cloned())
    }
}

#[derive(Default)]
pub(crate) struct RecordingAuditRepository {
    pub events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for RecordingAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for RecordingAuditRepository {
    async fn list_entries(
        &self,
        _tenant_id: TenantId,
        _query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        Ok(Vec::new())
    }
}

/// API state backed by fakes and a pool that never connects.
pub(crate) struct TestApp {
    pub state: AppState,
    pub tenant_id: TenantId,
    pub repository: Arc<FakeRbacRepository>,
    pub directory: Arc<FakeSubjectDirectory>,
    pub audit: Arc<RecordingAuditRepository>,
}

impl TestApp {
    pub(crate) fn new() -> Self {
        let repository = Arc::new(FakeRbacRepository::default());
        let directory = Arc::new(FakeSubjectDirectory::default());
        let audit = Arc::new(RecordingAuditRepository::default());
        let cache = Arc::new(InMemoryPermissionCache::new());
        let background_tasks = BackgroundTasks::new(Duration::from_secs(1));

        let authorization_service = AuthorizationService::new(
            EffectivePermissionResolver::new(repository.clone()),
            cache.clone(),
            audit.clone(),
            background_tasks,
            AuthorizationSettings::default(),
        );
        let role_admin_service = RoleAdminService::new(
            repository.clone(),
            directory.clone(),
            authorization_service.clone(),
            audit.clone(),
            audit.clone(),
        );
        let role_sync_service = RoleSyncService::new(
            repository.clone(),
            authorization_service.clone(),
            audit.clone(),
            cache,
            background_tasks,
            RoleMappingTable::default(),
            60,
        );

        let Ok(postgres_pool) =
            PgPoolOptions::new().connect_lazy("postgres://staffguard@localhost/staffguard")
        else {
            panic!("lazy pool should build from a valid url");
        };

        let state = AppState {
            authorization_service,
            role_admin_service,
            role_sync_service,
            subject_directory: directory.clone(),
            internal_service_secret: Some(Arc::from(INTERNAL_SECRET)),
            postgres_pool,
            redis_client: None,
            cache_backend: "memory",
        };

        Self {
            state,
            tenant_id: TenantId::new(),
            repository,
            directory,
            audit,
        }
    }

    pub(crate) async fn add_staff(&self, provider_subject: &str, two_factor_enabled: bool) -> SubjectId {
        let subject_id = SubjectId::new();
        self.directory.subjects.lock().await.push(SubjectRecord {
            subject_id,
            tenant_id: self.tenant_id,
            vendor_id: None,
            provider_subject: Some(provider_subject.to_owned()),
            email: format!("{provider_subject}@example.com"),
            is_active: true,
            two_factor_enabled,
        });
        subject_id
    }

    pub(crate) async fn deactivate_staff(&self, subject_id: SubjectId) {
        for subject in self.directory.subjects.lock().await.iter_mut() {
            if subject.subject_id == subject_id {
                subject.is_active = false;
            }
        }
    }

    /// Builds a gateway-authenticated request for the staff member.
    pub(crate) fn request(&self, method: &str, uri: &str, provider_subject: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(crate::middleware::TENANT_HEADER, self.tenant_id.to_string())
            .header(crate::middleware::USER_HEADER, provider_subject)
    }
}

pub(crate) async fn body_json(response: Response<Body>) -> serde_json::Value {
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body should be readable");
    };
    let Ok(value) = serde_json::from_slice(&bytes) else {
        panic!("body should be json");
    };
    value
}

/// Lets detached audit and cache tasks finish.
pub(crate) async fn settle_background_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}
