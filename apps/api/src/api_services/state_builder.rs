use std::sync::Arc;

use sqlx::PgPool;
use staffguard_application::{
    AuditLogRepository, AuditRepository, AuthorizationService, AuthorizationSettings,
    BackgroundTasks, EffectivePermissionResolver, RbacRepository, RoleAdminService,
    RoleMappingTable, RoleSyncService, SubjectDirectory,
};
use staffguard_core::AppError;
use staffguard_infrastructure::{
    PostgresAuditLogRepository, PostgresAuditRepository, PostgresRbacRepository,
    PostgresSubjectDirectory,
};

use crate::api_config::ApiConfig;
use crate::state::AppState;

use super::cache::build_permission_cache;

pub async fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let cache_setup = build_permission_cache(config).await?;

    let rbac_repository: Arc<dyn RbacRepository> =
        Arc::new(PostgresRbacRepository::new(pool.clone()));
    let subject_directory: Arc<dyn SubjectDirectory> =
        Arc::new(PostgresSubjectDirectory::new(pool.clone()));
    let audit_repository: Arc<dyn AuditRepository> =
        Arc::new(PostgresAuditRepository::new(pool.clone()));
    let audit_log_repository: Arc<dyn AuditLogRepository> =
        Arc::new(PostgresAuditLogRepository::new(pool.clone()));
    let background_tasks = BackgroundTasks::new(config.background_task_timeout);

    let authorization_service = AuthorizationService::new(
        EffectivePermissionResolver::new(rbac_repository.clone()),
        cache_setup.cache.clone(),
        audit_repository.clone(),
        background_tasks,
        AuthorizationSettings {
            cache_ttl_seconds: config.cache_ttl_seconds,
            lookup_timeout: config.authorization_timeout,
        },
    );

    let role_admin_service = RoleAdminService::new(
        rbac_repository.clone(),
        subject_directory.clone(),
        authorization_service.clone(),
        audit_repository.clone(),
        audit_log_repository,
    );

    let role_sync_service = RoleSyncService::new(
        rbac_repository,
        authorization_service.clone(),
        audit_repository,
        cache_setup.cache,
        background_tasks,
        RoleMappingTable::default(),
        config.role_sync_throttle_seconds,
    );

    Ok(AppState {
        authorization_service,
        role_admin_service,
        role_sync_service,
        subject_directory,
        internal_service_secret: config
            .internal_service_secret
            .as_deref()
            .map(Arc::from),
        postgres_pool: pool,
        redis_client: cache_setup.redis_client,
        cache_backend: cache_setup.backend,
    })
}
