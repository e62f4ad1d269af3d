//! Redis-backed permission cache.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use staffguard_application::{PermissionCache, SubjectScope};
use staffguard_core::{AppError, AppResult, SubjectId, TenantId};
use staffguard_domain::EffectivePermissions;

const SCAN_BATCH_SIZE: usize = 200;

/// Redis implementation of the permission cache port.
///
/// Entries are JSON-encoded permission sets stored under
/// `{prefix}:perms:{tenant}:{vendor|global}:{subject}` with a per-entry ttl.
#[derive(Clone)]
pub struct RedisPermissionCache {
    client: redis::Client,
    key_prefix: String,
}

impl RedisPermissionCache {
    /// Creates a cache adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, scope: &SubjectScope) -> String {
        format!("{}:{}", self.key_prefix, scope.cache_key())
    }

    fn sync_slot_key(&self, tenant_id: TenantId, subject_id: SubjectId) -> String {
        format!("{}:role-sync:{tenant_id}:{subject_id}", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }

    /// Deletes every key matching a glob pattern, one SCAN batch at a time.
    async fn delete_matching(&self, pattern: &str) -> AppResult<usize> {
        let mut connection = self.connection().await?;
        let mut cursor: u64 = 0;
        let mut removed = 0_usize;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE)
                .query_async(&mut connection)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to scan permission cache: {error}"))
                })?;

            if !keys.is_empty() {
                removed += keys.len();
                connection.del::<_, ()>(keys).await.map_err(|error| {
                    AppError::Internal(format!(
                        "failed to delete permission cache entries: {error}"
                    ))
                })?;
            }

            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }

        Ok(removed)
    }
}

#[async_trait]
impl PermissionCache for RedisPermissionCache {
    async fn get(&self, scope: &SubjectScope) -> AppResult<Option<EffectivePermissions>> {
        let mut connection = self.connection().await?;

        let encoded: Option<String> = connection.get(self.key_for(scope)).await.map_err(|error| {
            AppError::Internal(format!("failed to read permission cache entry: {error}"))
        })?;

        encoded
            .as_deref()
            .map(|value| {
                serde_json::from_str::<EffectivePermissions>(value).map_err(|error| {
                    AppError::Internal(format!(
                        "invalid permission cache entry for '{scope}': {error}"
                    ))
                })
            })
            .transpose()
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

        let value = serde_json::to_string(permissions).map_err(|error| {
            AppError::Internal(format!("failed to encode permission cache entry: {error}"))
        })?;
        let mut connection = self.connection().await?;

        connection
            .set_ex(self.key_for(scope), value, u64::from(ttl_seconds))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to write permission cache entry: {error}"))
            })
    }

    async fn invalidate(&self, scope: &SubjectScope) -> AppResult<()> {
        let mut connection = self.connection().await?;

        connection
            .del::<_, ()>(self.key_for(scope))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete permission cache entry: {error}"))
            })
    }

    async fn invalidate_subject(
        &self,
        tenant_id: TenantId,
        subject_id: SubjectId,
    ) -> AppResult<()> {
        let pattern = format!(
            "{}:{}",
            self.key_prefix,
            SubjectScope::subject_key_pattern(tenant_id, subject_id)
        );
        let removed = self.delete_matching(pattern.as_str()).await?;

        tracing::debug!(
            tenant_id = %tenant_id,
            subject_id = %subject_id,
            removed,
            "invalidated subject permission cache"
        );
        Ok(())
    }

    async fn invalidate_tenant(&self, tenant_id: TenantId) -> AppResult<()> {
        let pattern = format!(
            "{}:{}*",
            self.key_prefix,
            SubjectScope::tenant_key_prefix(tenant_id)
        );
        let removed = self.delete_matching(pattern.as_str()).await?;

        tracing::debug!(tenant_id = %tenant_id, removed, "invalidated tenant permission cache");
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

        let mut connection = self.connection().await?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.sync_slot_key(tenant_id, subject_id))
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(u64::from(ttl_seconds))
            .query_async(&mut connection)
            .await
            .map_err(|error| AppError::Internal(format!("failed to claim role sync slot: {error}")))?;

        Ok(reply.is_some())
    }

    async fn release_sync_slot(
        &self,
        tenant_id: TenantId,
        subject_id: SubjectId,
    ) -> AppResult<()> {
        let mut connection = self.connection().await?;

        connection
            .del::<_, ()>(self.sync_slot_key(tenant_id, subject_id))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to release role sync slot: {error}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use staffguard_application::{PermissionCache, SubjectScope};
    use staffguard_core::{SubjectId, TenantId, VendorId};
    use staffguard_domain::EffectivePermissions;

    use super::RedisPermissionCache;

    fn test_cache() -> Option<RedisPermissionCache> {
        let Ok(redis_url) = std::env::var("REDIS_URL") else {
            return None;
        };

        match redis::Client::open(redis_url.as_str()) {
            Ok(client) => Some(RedisPermissionCache::new(
                client,
                format!("staffguard-test-{}", uuid::Uuid::new_v4()),
            )),
            Err(error) => panic!("invalid REDIS_URL in test: {error}"),
        }
    }

    #[tokio::test]
    async fn entries_round_trip_and_tenant_invalidation_clears_every_scope() {
        let Some(cache) = test_cache() else {
            return;
        };

        let tenant_id = TenantId::new();
        let subject_id = SubjectId::new();
        let global = SubjectScope::new(tenant_id, None, subject_id);
        let vendor = SubjectScope::new(tenant_id, Some(VendorId::new()), subject_id);
        let other_tenant = SubjectScope::new(TenantId::new(), None, subject_id);

        for scope in [global, vendor, other_tenant] {
            let permissions =
                EffectivePermissions::empty(scope.tenant_id, scope.vendor_id, scope.subject_id);
            assert!(cache.set(&scope, &permissions, 60).await.is_ok());
        }

        let cached = cache.get(&vendor).await;
        assert!(matches!(cached, Ok(Some(ref value)) if value.vendor_id == vendor.vendor_id));

        assert!(cache.invalidate_tenant(tenant_id).await.is_ok());
        assert!(matches!(cache.get(&global).await, Ok(None)));
        assert!(matches!(cache.get(&vendor).await, Ok(None)));
        assert!(matches!(cache.get(&other_tenant).await, Ok(Some(_))));
    }

    #[tokio::test]
    async fn sync_slot_is_claimed_once_per_window() {
        let Some(cache) = test_cache() else {
            return;
        };

        let tenant_id = TenantId::new();
        let subject_id = SubjectId::new();

        assert!(matches!(cache.claim_sync_slot(tenant_id, subject_id, 60).await, Ok(true)));
        assert!(matches!(cache.claim_sync_slot(tenant_id, subject_id, 60).await, Ok(false)));
        assert!(matches!(cache.claim_sync_slot(tenant_id, subject_id, 0).await, Ok(true)));
    }

    #[tokio::test]
    async fn subject_invalidation_reaches_vendor_scoped_keys() {
        let Some(cache) = test_cache() else {
            return;
        };

        let tenant_id = TenantId::new();
        let subject_id = SubjectId::new();
        let global = SubjectScope::new(tenant_id, None, subject_id);
        let vendor = SubjectScope::new(tenant_id, Some(VendorId::new()), subject_id);
        let colleague = SubjectScope::new(tenant_id, Some(VendorId::new()), SubjectId::new());

        for scope in [global, vendor, colleague] {
            let permissions =
                EffectivePermissions::empty(scope.tenant_id, scope.vendor_id, scope.subject_id);
            assert!(cache.set(&scope, &permissions, 60).await.is_ok());
        }

        assert!(cache.invalidate_subject(tenant_id, subject_id).await.is_ok());
        assert!(matches!(cache.get(&global).await, Ok(None)));
        assert!(matches!(cache.get(&vendor).await, Ok(None)));
        assert!(matches!(cache.get(&colleague).await, Ok(Some(_))));

        assert!(matches!(cache.claim_sync_slot(tenant_id, subject_id, 60).await, Ok(true)));
        assert!(cache.release_sync_slot(tenant_id, subject_id).await.is_ok());
        assert!(matches!(cache.claim_sync_slot(tenant_id, subject_id, 60).await, Ok(true)));
    }
}
