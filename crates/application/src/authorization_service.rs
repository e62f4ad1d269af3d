use std::sync::Arc;
use std::time::Duration;

use staffguard_core::{AppError, AppResult, AssertedIdentity, DenialCode, TenantId};
use staffguard_domain::{AuditAction, Capability, EffectivePermissions};

use crate::{
    AuditEvent, AuditRepository, BackgroundTasks, ClientMetadata, EffectivePermissionResolver,
    PermissionCache, SubjectRecord, SubjectScope,
};


/// Authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Scope the caller acts in.
    pub scope: SubjectScope,
    /// Client metadata for audit events.
    pub client: ClientMetadata,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub fn new(scope: SubjectScope, client: ClientMetadata) -> Self {
        Self { scope, client }
    }
}

/// Tunables for the request-path permission lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationSettings {
    /// Ttl for cached permission sets; zero disables cache writes.
    pub cache_ttl_seconds: u32,
    /// Bound applied separately to the cache read and the store read.
    pub lookup_timeout: Duration,
}

impl Default for AuthorizationSettings {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: 300,
            lookup_timeout: Duration::from_millis(2000),
        }
    }
}

/// Application service for tenant-scoped authorization checks.
#[derive(Clone)]
pub struct AuthorizationService {
    resolver: EffectivePermissionResolver,
    cache: Arc<dyn PermissionCache>,
    audit_repository: Arc<dyn AuditRepository>,
    background_tasks: BackgroundTasks,
    settings: AuthorizationSettings,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(
        resolver: EffectivePermissionResolver,
        cache: Arc<dyn PermissionCache>,
        audit_repository: Arc<dyn AuditRepository>,
        background_tasks: BackgroundTasks,
        settings: AuthorizationSettings,
    ) -> Self {
        Self {
            resolver,
            cache,
            audit_repository,
            background_tasks,
            settings,
        }
    }

    /// Returns effective permissions, cache first.
    ///
    /// Cache failures and cache timeouts count as misses. A miss is answered from the
    /// store and the cache is populated by a detached task.
    pub async fn effective_permissions(
        &self,
        scope: &SubjectScope,
    ) -> AppResult<EffectivePermissions> {
        match tokio::time::timeout(self.settings.lookup_timeout, self.cache.get(scope)).await {
            Ok(Ok(Some(permissions))) => return Ok(permissions),
            Ok(Ok(None)) => {}
            Ok(Err(error)) => {
                tracing::warn!(scope = %scope, error = %error, "permission cache read failed");
            }
            Err(_) => {
                tracing::warn!(scope = %scope, "permission cache read timed out");
            }
        }

        let permissions = tokio::time::timeout(
            self.settings.lookup_timeout,
            self.resolver.get_effective_permissions(scope),
        )
        .await
        .map_err(|_| {
            AppError::Internal(format!("permission resolution timed out for '{scope}'"))
        })??;

        if self.settings.cache_ttl_seconds > 0 {
            let cache = self.cache.clone();
            let scope = *scope;
            let value = permissions.clone();
            let ttl_seconds = self.settings.cache_ttl_seconds;
            self.background_tasks.spawn("permission_cache_write", async move {
                cache.set(&scope, &value, ttl_seconds).await
            });
        }

        Ok(permissions)
    }

    /// Returns the highest role priority, cache first.
    pub async fn max_priority(&self, scope: &SubjectScope) -> AppResult<i32> {
        Ok(self.effective_permissions(scope).await?.max_priority)
    }

    /// Returns whether the subject holds the permission. Infrastructure errors propagate.
    pub async fn authorize(&self, scope: &SubjectScope, permission: &str) -> AppResult<bool> {
        Ok(self.effective_permissions(scope).await?.authorizes(permission))
    }

    /// Ensures the subject holds a permission; a denial is audited in the background.
    pub async fn require_permission(
        &self,
        actor: &Actor,
        permission: &str,
    ) -> AppResult<EffectivePermissions> {
        let permissions = self.permissions_or_deny(&actor.scope).await?;
        if permissions.authorizes(permission) {
            return Ok(permissions);
        }

        self.deny(actor, permission.to_owned())
    }

    /// Ensures the subject holds at least one of the permissions.
    pub async fn require_any_permission(
        &self,
        actor: &Actor,
        permissions: &[&str],
    ) -> AppResult<EffectivePermissions> {
        let effective = self.permissions_or_deny(&actor.scope).await?;
        if effective.authorizes_any(permissions) {
            return Ok(effective);
        }

        self.deny(actor, permissions.join(" | "))
    }

    /// Ensures the subject holds every permission.
    pub async fn require_all_permissions(
        &self,
        actor: &Actor,
        permissions: &[&str],
    ) -> AppResult<EffectivePermissions> {
        let effective = self.permissions_or_deny(&actor.scope).await?;
        match permissions
            .iter()
            .find(|permission| !effective.authorizes(permission))
        {
            None => Ok(effective),
            Some(missing) => self.deny(actor, (*missing).to_owned()),
        }
    }

    /// Ensures the subject's highest role priority reaches `minimum`.
    pub async fn require_min_priority(
        &self,
        actor: &Actor,
        minimum: i32,
    ) -> AppResult<EffectivePermissions> {
        let permissions = self.permissions_or_deny(&actor.scope).await?;
        if permissions.meets_priority(minimum) {
            return Ok(permissions);
        }

        Err(AppError::InsufficientPriority {
            required: minimum,
            actual: permissions.max_priority,
        })
    }

    /// Ensures the subject holds a capability.
    pub async fn require_capability(
        &self,
        actor: &Actor,
        capability: Capability,
    ) -> AppResult<EffectivePermissions> {
        let permissions = self.permissions_or_deny(&actor.scope).await?;
        ensure_capability(&permissions, capability)?;
        Ok(permissions)
    }

    /// Ensures the session passed a secondary-factor check. Evaluated before any RBAC gate.
    pub fn require_step_up(
        &self,
        subject: &SubjectRecord,
        identity: &AssertedIdentity,
    ) -> AppResult<()> {
        if !subject.two_factor_enabled {
            return Err(AppError::PolicyDenied {
                code: DenialCode::StepUpRequired,
                message: "two-factor authentication must be enabled for this operation"
                    .to_owned(),
            });
        }

        if !identity.step_up_verified() {
            return Err(AppError::PolicyDenied {
                code: DenialCode::StepUpNotVerified,
                message: "two-factor verification is required for this operation".to_owned(),
            });
        }

        Ok(())
    }

    /// Removes the cached sets a change in `scope` can affect.
    ///
    /// A tenant-wide change reaches every vendor scope of the subject, so all of its entries
    /// are dropped. A vendor-scoped change drops that vendor's entry and the tenant-wide one.
    pub async fn invalidate_subject(&self, scope: &SubjectScope) {
        let result = match scope.vendor_id {
            None => {
                self.cache
                    .invalidate_subject(scope.tenant_id, scope.subject_id)
                    .await
            }
            Some(_) => match self.cache.invalidate(scope).await {
                Ok(()) => self.cache.invalidate(&scope.tenant_wide()).await,
                Err(error) => Err(error),
            },
        };

        if let Err(error) = result {
            tracing::warn!(scope = %scope, error = %error, "permission cache invalidation failed");
        }
    }

    /// Removes every cached set of a tenant.
    pub async fn invalidate_tenant(&self, tenant_id: TenantId) {
        if let Err(error) = self.cache.invalidate_tenant(tenant_id).await {
            tracing::warn!(
                tenant_id = %tenant_id,
                error = %error,
                "permission cache tenant invalidation failed"
            );
        }
    }

    /// Returns effective permissions, turning any infrastructure failure into a denial.
    ///
    /// The failure is logged at `error`; callers only ever see `Forbidden`.
    pub async fn permissions_or_deny(
        &self,
        scope: &SubjectScope,
    ) -> AppResult<EffectivePermissions> {
        self.effective_permissions(scope).await.map_err(|error| {
            tracing::error!(scope = %scope, error = %error, "authorization could not be evaluated");
            AppError::Forbidden("authorization could not be evaluated".to_owned())
        })
    }

    fn deny(&self, actor: &Actor, permission: String) -> AppResult<EffectivePermissions> {
        tracing::info!(
            tenant_id = %actor.scope.tenant_id,
            subject_id = %actor.scope.subject_id,
            permission = permission.as_str(),
            "permission denied"
        );

        let audit_repository = self.audit_repository.clone();
        let event = AuditEvent {
            tenant_id: actor.scope.tenant_id,
            vendor_id: actor.scope.vendor_id,
            actor: Some(actor.scope.subject_id),
            action: AuditAction::PermissionDenied,
            entity_type: "permission".to_owned(),
            entity_id: Some(permission.clone()),
            target_subject: None,
            detail: Some(format!("missing permission '{permission}'")),
            client: actor.client.clone(),
        };
        self.background_tasks
            .spawn("permission_denied_audit", async move {
                audit_repository.append_event(event).await
            });

        Err(AppError::PermissionDenied { permission })
    }
}

/// Maps a missing capability to its coded denial.
pub(crate) fn ensure_capability(
    permissions: &EffectivePermissions,
    capability: Capability,
) -> AppResult<()> {
    if permissions.has_capability(capability) {
        return Ok(());
    }

    let (code, message) = match capability {
        Capability::ManageStaff => (
            DenialCode::CannotManageStaff,
            "you do not have permission to manage staff roles",
        ),
        Capability::CreateRoles => (
            DenialCode::CannotManageRoles,
            "you do not have permission to create roles",
        ),
        Capability::DeleteRoles => (
            DenialCode::CannotDeleteRoles,
            "you do not have permission to delete roles",
        ),
    };

    Err(AppError::PolicyDenied {
        code,
        message: message.to_owned(),
    })
}
