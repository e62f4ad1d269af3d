use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use staffguard_core::{AppError, AppResult, AssertedIdentity, SubjectId};
use staffguard_domain::AuditAction;
use uuid::Uuid;

use crate::{
    AssignRoleInput, AuditEvent, AuditRepository, AuthorizationService, BackgroundTasks,
    ClientMetadata, PermissionCache, RbacRepository, SubjectScope,
};

mod mappings;


pub use mappings::{ProviderRoleMapping, RoleMappingTable};

/// Result of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSyncOutcome {
    /// Local role names granted by this run.
    pub granted: Vec<String>,
    /// Asserted names that did not lead to a grant, with the reason.
    pub skipped: Vec<(String, String)>,
}

/// Reconciles identity-provider role claims into local assignments.
///
/// Reconciliation is additive: assignments that are no longer asserted are kept.
#[derive(Clone)]
pub struct RoleSyncService {
    repository: Arc<dyn RbacRepository>,
    authorization_service: AuthorizationService,
    audit_repository: Arc<dyn AuditRepository>,
    cache: Arc<dyn PermissionCache>,
    background_tasks: BackgroundTasks,
    mappings: Arc<RoleMappingTable>,
    throttle_seconds: u32,
}

impl RoleSyncService {
    /// Creates a new role sync service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RbacRepository>,
        authorization_service: AuthorizationService,
        audit_repository: Arc<dyn AuditRepository>,
        cache: Arc<dyn PermissionCache>,
        background_tasks: BackgroundTasks,
        mappings: RoleMappingTable,
        throttle_seconds: u32,
    ) -> Self {
        Self {
            repository,
            authorization_service,
            audit_repository,
            cache,
            background_tasks,
            mappings: Arc::new(mappings),
            throttle_seconds,
        }
    }

    /// Launches a detached sync unless the subject was synced within the throttle window.
    ///
    /// Returns whether a task was launched. The caller never waits for the sync itself.
    pub fn schedule_sync(&self, identity: &AssertedIdentity, subject_id: SubjectId) -> bool {
        if !identity.has_role_claims() {
            return false;
        }

        let service = self.clone();
        let identity = identity.clone();
        self.background_tasks.spawn("role_sync", async move {
            service.run_throttled_sync(&identity, subject_id).await;
            Ok(())
        });

        true
    }

    /// Grants every asserted role the subject does not hold yet.
    ///
    /// Failures on individual roles are logged and do not stop the remaining roles.
    pub async fn sync_roles_for_staff(
        &self,
        identity: &AssertedIdentity,
        subject_id: SubjectId,
    ) -> AppResult<RoleSyncOutcome> {
        let tenant_id = identity.tenant_id();
        let vendor_id = identity.vendor_id();
        let mut outcome = RoleSyncOutcome::default();

        let desired = self.desired_local_roles(identity, &mut outcome);
        if desired.is_empty() {
            return Ok(outcome);
        }

        let now = Utc::now();
        let mut held: BTreeSet<Uuid> = self
            .repository
            .list_subject_assignments(tenant_id, subject_id)
            .await?
            .into_iter()
            .filter(|assignment| {
                assignment.is_active
                    && assignment.expires_at.is_none_or(|expires_at| expires_at > now)
                    && (assignment.vendor_id.is_none() || assignment.vendor_id == vendor_id)
            })
            .map(|assignment| assignment.role_id)
            .collect();

        for local_role in desired {
            let role = match self
                .repository
                .find_role_by_name(tenant_id, vendor_id, local_role.as_str())
                .await
            {
                Ok(Some(role)) => role,
                Ok(None) => {
                    outcome
                        .skipped
                        .push((local_role, "no local role with this name".to_owned()));
                    continue;
                }
                Err(error) => {
                    tracing::warn!(
                        tenant_id = %tenant_id,
                        subject_id = %subject_id,
                        role = local_role.as_str(),
                        error = %error,
                        "role lookup failed during sync"
                    );
                    outcome.skipped.push((local_role, error.to_string()));
                    continue;
                }
            };

            if !role.is_active {
                outcome
                    .skipped
                    .push((local_role, "local role is inactive".to_owned()));
                continue;
            }

            if !held.insert(role.role_id) {
                continue;
            }

            let input = AssignRoleInput {
                subject_id,
                role_id: role.role_id,
                vendor_id,
                is_primary: false,
                expires_at: None,
                assigned_by: None,
                notes: Some("synced from identity provider".to_owned()),
            };

            match self.repository.assign_role(tenant_id, input).await {
                Ok(_) => outcome.granted.push(role.name),
                Err(AppError::Conflict(_)) => {}
                Err(error) => {
                    tracing::warn!(
                        tenant_id = %tenant_id,
                        subject_id = %subject_id,
                        role = role.name.as_str(),
                        error = %error,
                        "role assignment failed during sync"
                    );
                    outcome.skipped.push((role.name, error.to_string()));
                }
            }
        }

        if !outcome.granted.is_empty() {
            let scope = SubjectScope::new(tenant_id, vendor_id, subject_id);
            self.authorization_service.invalidate_subject(&scope).await;

            tracing::info!(
                tenant_id = %tenant_id,
                subject_id = %subject_id,
                granted = ?outcome.granted,
                "synced identity-provider roles"
            );

            let event = AuditEvent {
                tenant_id,
                vendor_id,
                actor: None,
                action: AuditAction::RolesSynced,
                entity_type: "staff".to_owned(),
                entity_id: Some(subject_id.to_string()),
                target_subject: Some(subject_id),
                detail: Some(format!("granted roles: {}", outcome.granted.join(", "))),
                client: ClientMetadata::default(),
            };
            if let Err(error) = self.audit_repository.append_event(event).await {
                tracing::warn!(subject_id = %subject_id, error = %error, "role sync audit failed");
            }
        }

        Ok(outcome)
    }

    /// Claims the throttle slot, then syncs. A failed sync hands the slot back so the next
    /// request retries instead of waiting out the window.
    async fn run_throttled_sync(&self, identity: &AssertedIdentity, subject_id: SubjectId) {
        let tenant_id = identity.tenant_id();
        match self
            .cache
            .claim_sync_slot(tenant_id, subject_id, self.throttle_seconds)
            .await
        {
            Ok(true) => {}
            Ok(false) => return,
            Err(error) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    subject_id = %subject_id,
                    roles = ?identity.provider_roles(),
                    error = %error,
                    "role sync throttle could not be claimed; sync skipped"
                );
                return;
            }
        }

        let Err(error) = self.sync_roles_for_staff(identity, subject_id).await else {
            return;
        };
        tracing::warn!(
            tenant_id = %tenant_id,
            subject_id = %subject_id,
            roles = ?identity.provider_roles(),
            error = %error,
            "role sync failed"
        );

        if let Err(error) = self.cache.release_sync_slot(tenant_id, subject_id).await {
            tracing::warn!(
                tenant_id = %tenant_id,
                subject_id = %subject_id,
                error = %error,
                "role sync throttle could not be released"
            );
        }
    }

    fn desired_local_roles(
        &self,
        identity: &AssertedIdentity,
        outcome: &mut RoleSyncOutcome,
    ) -> Vec<String> {
        let mut desired: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if !desired.iter().any(|existing| existing == name) {
                desired.push(name.to_owned());
            }
        };

        if identity.is_platform_owner()
            && let Some(mapping) = self.mappings.highest()
        {
            push(mapping.local_role.as_str());
        }

        for provider_role in identity.provider_roles() {
            match self.mappings.lookup(provider_role) {
                Some(mapping) if mapping.vendor_only && identity.vendor_id().is_none() => {
                    outcome.skipped.push((
                        provider_role.clone(),
                        "vendor role without vendor context".to_owned(),
                    ));
                }
                Some(mapping) => push(mapping.local_role.as_str()),
                None => push(provider_role.as_str()),
            }
        }

        desired
    }
}
