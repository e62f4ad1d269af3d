use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use staffguard_application::{PermissionCache, SubjectScope};
use staffguard_core::{AppResult, SubjectId, TenantId};
use staffguard_domain::EffectivePermissions;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct PermissionCacheEntry {
    permissions: EffectivePermissions,
    expires_at: Instant,
}

/// In-memory cache adapter for permission sets, local to one process.
#[derive(Default)]
pub struct InMemoryPermissionCache {
    entries: RwLock<HashMap<SubjectScope, PermissionCacheEntry>>,
    sync_slots: RwLock<HashMap<(TenantId, SubjectId), Instant>>,
}

impl InMemoryPermissionCache {
    /// Creates an empty in-memory permission cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn expiry_after(ttl_seconds: u32) -> Instant {
    let now = Instant::now();
    now.checked_add(Duration::from_secs(u64::from(ttl_seconds)))
        .unwrap_or(now)
}

#[async_trait]
impl PermissionCache for InMemoryPermissionCache {
    async fn get(&self, scope: &SubjectScope) -> AppResult<Option<EffectivePermissions>> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(scope) {
                if entry.expires_at > Instant::now() {
                    return Ok(Some(entry.permissions.clone()));
                }
            } else {
                return Ok(None);
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(scope)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(scope);
        }

        Ok(None)
    }

    async fn set(
        &self,
        scope: &SubjectScope,
        permissions: &EffectivePermissions,
        ttl_seconds: u32,
    ) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            *scope,
            PermissionCacheEntry {
                permissions: permissions.clone(),
                expires_at: expiry_after(ttl_seconds),
            },
        );

        Ok(())
    }

    async fn invalidate(&self, scope: &SubjectScope) -> AppResult<()> {
        self.entries.write().await.remove(scope);
        Ok(())
    }

    async fn invalidate_subject(
        &self,
        tenant_id: TenantId,
        subject_id: SubjectId,
    ) -> AppResult<()> {
        self.entries
            .write()
            .await
            .retain(|scope, _| scope.tenant_id != tenant_id || scope.subject_id != subject_id);
        Ok(())
    }

    async fn invalidate_tenant(&self, tenant_id: TenantId) -> AppResult<()> {
        self.entries
            .write()
            .await
            .retain(|scope, _| scope.tenant_id != tenant_id);
        Ok(())
    }

    async fn claim_sync_slot(
        &self,
        tenant_id: TenantId,
        subject_id: SubjectId,
        ttl_seconds: u32,
    ) -> AppResult<bool> {
        if ttl_seconds == 0 {
            return Ok(true);
        }

        let now = Instant::now();
        let mut slots = self.sync_slots.write().await;
        slots.retain(|_, expires_at| *expires_at > now);

        if slots.contains_key(&(tenant_id, subject_id)) {
            return Ok(false);
        }

        slots.insert((tenant_id, subject_id), expiry_after(ttl_seconds));
        Ok(true)
    }

    async fn release_sync_slot(
        &self,
        tenant_id: TenantId,
        subject_id: SubjectId,
    ) -> AppResult<()> {
        self.sync_slots
            .write()
            .await
            .remove(&(tenant_id, subject_id));
        Ok(())
    }
}
