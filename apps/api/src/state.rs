use std::sync::Arc;

use sqlx::PgPool;
use staffguard_application::{
    AuthorizationService, RoleAdminService, RoleSyncService, SubjectDirectory,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub role_admin_service: RoleAdminService,
    pub role_sync_service: RoleSyncService,
    pub subject_directory: Arc<dyn SubjectDirectory>,
    pub internal_service_secret: Option<Arc<str>>,
    pub postgres_pool: PgPool,
    pub redis_client: Option<redis::Client>,
    pub cache_backend: &'static str,
}
