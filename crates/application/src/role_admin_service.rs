use std::sync::Arc;

use staffguard_core::{AppError, AppResult, DenialCode, SubjectId};
use staffguard_domain::EffectivePermissions;

use crate::{
    Actor, AuditEvent, AuditLogRepository, AuditRepository, AuthorizationService,
    RbacRepository, RoleDefinition, SubjectDirectory,
};

mod assignments;
mod audit;
mod roles;
mod teams;


pub use assignments::AssignRoleRequest;

/// Application service for role and assignment administration.
#[derive(Clone)]
pub struct RoleAdminService {
    repository: Arc<dyn RbacRepository>,
    subject_directory: Arc<dyn SubjectDirectory>,
    authorization_service: AuthorizationService,
    audit_repository: Arc<dyn AuditRepository>,
    audit_log_repository: Arc<dyn AuditLogRepository>,
}

impl RoleAdminService {
    /// Creates a new role administration service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RbacRepository>,
        subject_directory: Arc<dyn SubjectDirectory>,
        authorization_service: AuthorizationService,
        audit_repository: Arc<dyn AuditRepository>,
        audit_log_repository: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            repository,
            subject_directory,
            authorization_service,
            audit_repository,
            audit_log_repository,
        }
    }

    async fn actor_permissions(&self, actor: &Actor) -> AppResult<EffectivePermissions> {
        self.authorization_service
            .permissions_or_deny(&actor.scope)
            .await
    }

    async fn require_role_in_scope(
        &self,
        actor: &Actor,
        role_id: uuid::Uuid,
    ) -> AppResult<RoleDefinition> {
        let role = self
            .repository
            .find_role(actor.scope.tenant_id, role_id)
            .await?
            .filter(|role| role.vendor_id.is_none() || role.vendor_id == actor.scope.vendor_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        Ok(role)
    }

    async fn require_active_subject(&self, actor: &Actor, subject_id: SubjectId) -> AppResult<()> {
        let subject = self
            .subject_directory
            .find_by_id(actor.scope.tenant_id, subject_id)
            .await?
            .filter(|subject| subject.is_active);

        if subject.is_none() {
            return Err(AppError::NotFound(format!(
                "staff member '{subject_id}' does not exist"
            )));
        }

        Ok(())
    }

    async fn append_audit(&self, event: AuditEvent) -> AppResult<()> {
        self.audit_repository.append_event(event).await
    }
}

/// Rejects actions on roles at or above the actor's own priority.
fn ensure_below_actor_priority(
    actor_permissions: &EffectivePermissions,
    role_priority: i32,
    action: &str,
) -> AppResult<()> {
    if role_priority >= actor_permissions.max_priority {
        return Err(AppError::PolicyDenied {
            code: DenialCode::PriorityBoundaryExceeded,
            message: format!(
                "cannot {action} a role with priority {role_priority}; your highest priority is {}",
                actor_permissions.max_priority
            ),
        });
    }

    Ok(())
}
