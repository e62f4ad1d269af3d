use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use staffguard_core::{AppResult, SubjectId, TenantId, VendorId};
use staffguard_domain::EffectivePermissions;

/// Tenant, optional vendor and subject that one permission set is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubjectScope {
    /// Tenant partition.
    pub tenant_id: TenantId,
    /// Vendor partition inside the tenant.
    pub vendor_id: Option<VendorId>,
    /// Staff subject.
    pub subject_id: SubjectId,
}

impl SubjectScope {
    /// Creates a scope.
    #[must_use]
    pub fn new(tenant_id: TenantId, vendor_id: Option<VendorId>, subject_id: SubjectId) -> Self {
        Self {
            tenant_id,
            vendor_id,
            subject_id,
        }
    }

    /// Returns the same subject without a vendor scope.
    #[must_use]
    pub fn tenant_wide(self) -> Self {
        Self {
            vendor_id: None,
            ..self
        }
    }

    /// Returns the backend-independent cache key, `perms:{tenant}:{vendor|global}:{subject}`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        match self.vendor_id {
            Some(vendor_id) => format!(
                "perms:{}:{}:{}",
                self.tenant_id, vendor_id, self.subject_id
            ),
            None => format!("perms:{}:global:{}", self.tenant_id, self.subject_id),
        }
    }

    /// Returns the key pattern matching every scope of one subject, `perms:{tenant}:*:{subject}`.
    #[must_use]
    pub fn subject_key_pattern(tenant_id: TenantId, subject_id: SubjectId) -> String {
        format!("perms:{tenant_id}:*:{subject_id}")
    }

    /// Returns the key prefix shared by every entry of the tenant.
    #[must_use]
    pub fn tenant_key_prefix(tenant_id: TenantId) -> String {
        format!("perms:{tenant_id}:")
    }
}

impl Display for SubjectScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.cache_key().as_str())
    }
}

/// Cache port for resolved permission sets and the role-sync throttle.
///
/// Implementations treat every failure as non-fatal for callers: reads that fail are
/// handled as misses by the authorization service.
#[async_trait]
pub trait PermissionCache: Send + Sync {
    /// Returns the cached permission set for a scope.
    async fn get(&self, scope: &SubjectScope) -> AppResult<Option<EffectivePermissions>>;

    /// Stores a permission set with ttl. A zero ttl stores nothing.
    async fn set(
        &self,
        scope: &SubjectScope,
        permissions: &EffectivePermissions,
        ttl_seconds: u32,
    ) -> AppResult<()>;

    /// Removes the entry of one scope.
    async fn invalidate(&self, scope: &SubjectScope) -> AppResult<()>;

    /// Removes the entries of every scope of one subject, tenant-wide and vendor scoped.
    async fn invalidate_subject(&self, tenant_id: TenantId, subject_id: SubjectId)
    -> AppResult<()>;

    /// Removes every entry of a tenant.
    async fn invalidate_tenant(&self, tenant_id: TenantId) -> AppResult<()>;

    /// Claims the per-subject role-sync slot. Returns `false` while a previous claim is live.
    async fn claim_sync_slot(
        &self,
        tenant_id: TenantId,
        subject_id: SubjectId,
        ttl_seconds: u32,
    ) -> AppResult<bool>;

    /// Releases a claimed role-sync slot before its ttl runs out.
    async fn release_sync_slot(&self, tenant_id: TenantId, subject_id: SubjectId)
    -> AppResult<()>;
}
