use super::*;

use staffguard_domain::{AuditAction, Capability};
use uuid::Uuid;

use crate::authorization_service::ensure_capability;

impl RoleAdminService {
    /// Sets or clears the role every member of a team inherits.
    ///
    /// Inheritance changes the permissions of all members at once, so the whole tenant cache
    /// is dropped.
    pub async fn set_team_default_role(
        &self,
        actor: &Actor,
        team_id: Uuid,
        role_id: Option<Uuid>,
    ) -> AppResult<()> {
        let actor_permissions = self.actor_permissions(actor).await?;
        ensure_capability(&actor_permissions, Capability::ManageStaff)?;

        let role_name = match role_id {
            Some(role_id) => {
                let role = self.require_role_in_scope(actor, role_id).await?;
                if !role.is_active {
                    return Err(AppError::Validation(format!(
                        "role '{}' is inactive and cannot be inherited",
                        role.name
                    )));
                }
                ensure_below_actor_priority(&actor_permissions, role.priority, "assign")?;
                Some(role.name)
            }
            None => None,
        };

        self.repository
            .set_team_default_role(actor.scope.tenant_id, team_id, role_id)
            .await?;

        self.authorization_service
            .invalidate_tenant(actor.scope.tenant_id)
            .await;

        let detail = match role_name {
            Some(name) => format!("team default role set to '{name}'"),
            None => "team default role cleared".to_owned(),
        };
        self.append_audit(AuditEvent {
            tenant_id: actor.scope.tenant_id,
            vendor_id: actor.scope.vendor_id,
            actor: Some(actor.scope.subject_id),
            action: AuditAction::TeamDefaultRoleSet,
            entity_type: "team".to_owned(),
            entity_id: Some(team_id.to_string()),
            target_subject: None,
            detail: Some(detail),
            client: actor.client.clone(),
        })
        .await
    }
}
