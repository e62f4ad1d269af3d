use std::sync::Arc;

use chrono::Utc;
use staffguard_core::AppResult;
use staffguard_domain::{EffectivePermissions, resolve_effective_permissions};

use crate::{RbacRepository, SubjectScope};

/// Resolves effective permissions straight from the role store.
#[derive(Clone)]
pub struct EffectivePermissionResolver {
    repository: Arc<dyn RbacRepository>,
}

impl EffectivePermissionResolver {
    /// Creates a resolver over a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn RbacRepository>) -> Self {
        Self { repository }
    }

    /// Aggregates every active, unexpired assignment in scope.
    pub async fn get_effective_permissions(
        &self,
        scope: &SubjectScope,
    ) -> AppResult<EffectivePermissions> {
        let grants = self
            .repository
            .list_role_grants(scope.tenant_id, scope.vendor_id, scope.subject_id)
            .await?;

        Ok(resolve_effective_permissions(
            scope.tenant_id,
            scope.vendor_id,
            scope.subject_id,
            &grants,
            Utc::now(),
        ))
    }

    /// Returns the highest role priority in scope, zero without assignments.
    pub async fn get_max_priority(&self, scope: &SubjectScope) -> AppResult<i32> {
        Ok(self.get_effective_permissions(scope).await?.max_priority)
    }
}
