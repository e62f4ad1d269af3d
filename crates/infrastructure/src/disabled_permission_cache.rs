use async_trait::async_trait;
use staffguard_application::{PermissionCache, SubjectScope};
use staffguard_core::{AppResult, SubjectId, TenantId};
use staffguard_domain::EffectivePermissions;

/// Permission cache that stores nothing.
///
/// Used when caching is switched off or Redis is unreachable at startup. Every read is a
/// miss and every sync claim succeeds, so role sync runs on each request.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledPermissionCache;

#[async_trait]
impl PermissionCache for DisabledPermissionCache {
    async fn get(&self, _scope: &SubjectScope) -> AppResult<Option<EffectivePermissions>> {
        Ok(None)
    }

    async fn set(
        &self,
        _scope: &SubjectScope,
        _permissions: &EffectivePermissions,
        _ttl_seconds: u32,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn invalidate(&self, _scope: &SubjectScope) -> AppResult<()> {
        Ok(())
    }

    async fn invalidate_subject(
        &self,
        _tenant_id: TenantId,
        _subject_id: SubjectId,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn invalidate_tenant(&self, _tenant_id: TenantId) -> AppResult<()> {
        Ok(())
    }

    async fn claim_sync_slot(
        &self,
        _tenant_id: TenantId,
        _subject_id: SubjectId,
        _ttl_seconds: u32,
    ) -> AppResult<bool> {
        Ok(true)
    }

    async fn release_sync_slot(
        &self,
        _tenant_id: TenantId,
        _subject_id: SubjectId,
    ) -> AppResult<()> {
        Ok(())
    }
}
