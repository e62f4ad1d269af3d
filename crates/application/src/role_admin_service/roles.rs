use super::*;

use staffguard_core::TenantId;
use staffguard_domain::{AuditAction, Capability, PermissionName, default_role_templates};
use uuid::Uuid;

use crate::authorization_service::ensure_capability;
use crate::{ClientMetadata, CreateRoleInput, UpdateRoleInput};

impl RoleAdminService {
    /// Returns roles visible in the actor's scope.
    pub async fn list_roles(&self, actor: &Actor) -> AppResult<Vec<RoleDefinition>> {
        self.repository
            .list_roles(actor.scope.tenant_id, actor.scope.vendor_id)
            .await
    }

    /// Creates a custom role below the actor's own priority and emits an audit event.
    pub async fn create_role(
        &self,
        actor: &Actor,
        mut input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let actor_permissions = self.actor_permissions(actor).await?;
        ensure_capability(&actor_permissions, Capability::CreateRoles)?;

        if input.priority <= 0 {
            return Err(AppError::Validation(
                "role priority must be greater than zero".to_owned(),
            ));
        }
        ensure_below_actor_priority(&actor_permissions, input.priority, "create")?;

        input.vendor_id = actor.scope.vendor_id;
        input.is_system = false;

        let role = self
            .repository
            .create_role(actor.scope.tenant_id, input)
            .await?;

        self.append_audit(AuditEvent {
            tenant_id: actor.scope.tenant_id,
            vendor_id: actor.scope.vendor_id,
            actor: Some(actor.scope.subject_id),
            action: AuditAction::RoleCreated,
            entity_type: "role".to_owned(),
            entity_id: Some(role.role_id.to_string()),
            target_subject: None,
            detail: Some(format!(
                "created role '{}' with priority {}",
                role.name, role.priority
            )),
            client: actor.client.clone(),
        })
        .await?;

        Ok(role)
    }

    /// Replaces a role's grants and drops every cached set of the tenant.
    pub async fn set_role_permissions(
        &self,
        actor: &Actor,
        role_id: Uuid,
        permissions: Vec<PermissionName>,
    ) -> AppResult<RoleDefinition> {
        let actor_permissions = self.actor_permissions(actor).await?;
        let role = self.require_role_in_scope(actor, role_id).await?;
        ensure_below_actor_priority(&actor_permissions, role.priority, "modify")?;

        let mut permissions = permissions;
        permissions.sort();
        permissions.dedup();

        let updated = self
            .repository
            .set_role_permissions(actor.scope.tenant_id, role_id, &permissions)
            .await?;

        self.authorization_service
            .invalidate_tenant(actor.scope.tenant_id)
            .await;

        self.append_audit(AuditEvent {
            tenant_id: actor.scope.tenant_id,
            vendor_id: actor.scope.vendor_id,
            actor: Some(actor.scope.subject_id),
            action: AuditAction::RolePermissionsUpdated,
            entity_type: "role".to_owned(),
            entity_id: Some(role_id.to_string()),
            target_subject: None,
            detail: Some(format!(
                "replaced grants of role '{}': [{}]",
                updated.name,
                updated.permissions.join(", ")
            )),
            client: actor.client.clone(),
        })
        .await?;

        Ok(updated)
    }

    /// Updates a role's attributes and drops every cached set of the tenant.
    ///
    /// The role must sit below the actor, its new priority must stay below the actor, and
    /// capability flags can only be switched on by an actor holding them.
    pub async fn update_role(
        &self,
        actor: &Actor,
        role_id: Uuid,
        input: UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let actor_permissions = self.actor_permissions(actor).await?;
        ensure_capability(&actor_permissions, Capability::CreateRoles)?;

        if input.is_empty() {
            return Err(AppError::Validation("role update carries no changes".to_owned()));
        }

        let existing = self.require_role_in_scope(actor, role_id).await?;
        ensure_below_actor_priority(&actor_permissions, existing.priority, "update")?;

        if let Some(priority) = input.priority {
            if priority <= 0 {
                return Err(AppError::Validation(
                    "role priority must be greater than zero".to_owned(),
                ));
            }
            if priority >= actor_permissions.max_priority {
                return Err(AppError::PolicyDenied {
                    code: DenialCode::PriorityEscalationDenied,
                    message: format!(
                        "cannot raise a role to priority {priority}; your highest priority is {}",
                        actor_permissions.max_priority
                    ),
                });
            }
        }

        for (requested, capability) in [
            (input.can_manage_staff, Capability::ManageStaff),
            (input.can_create_roles, Capability::CreateRoles),
            (input.can_delete_roles, Capability::DeleteRoles),
        ] {
            if requested == Some(true) && !actor_permissions.has_capability(capability) {
                return Err(AppError::PolicyDenied {
                    code: DenialCode::CannotGrantCapability,
                    message: format!(
                        "cannot grant the '{}' capability without holding it",
                        capability.implied_by()
                    ),
                });
            }
        }

        let updated = self
            .repository
            .update_role(actor.scope.tenant_id, role_id, &input)
            .await?;

        self.authorization_service
            .invalidate_tenant(actor.scope.tenant_id)
            .await;

        self.append_audit(AuditEvent {
            tenant_id: actor.scope.tenant_id,
            vendor_id: actor.scope.vendor_id,
            actor: Some(actor.scope.subject_id),
            action: AuditAction::RoleUpdated,
            entity_type: "role".to_owned(),
            entity_id: Some(role_id.to_string()),
            target_subject: None,
            detail: Some(format!(
                "updated role '{}': priority {} -> {}, active {} -> {}",
                updated.name,
                existing.priority,
                updated.priority,
                existing.is_active,
                updated.is_active
            )),
            client: actor.client.clone(),
        })
        .await?;

        Ok(updated)
    }

    /// Soft-deletes a custom role below the actor and drops every cached set of the tenant.
    pub async fn delete_role(&self, actor: &Actor, role_id: Uuid) -> AppResult<()> {
        let actor_permissions = self.actor_permissions(actor).await?;
        ensure_capability(&actor_permissions, Capability::DeleteRoles)?;

        let role = self.require_role_in_scope(actor, role_id).await?;
        if role.is_system {
            return Err(AppError::PolicyDenied {
                code: DenialCode::SystemRoleProtected,
                message: format!("system role '{}' cannot be deleted", role.name),
            });
        }
        ensure_below_actor_priority(&actor_permissions, role.priority, "delete")?;

        self.repository
            .soft_delete_role(actor.scope.tenant_id, role_id)
            .await?;

        self.authorization_service
            .invalidate_tenant(actor.scope.tenant_id)
            .await;

        self.append_audit(AuditEvent {
            tenant_id: actor.scope.tenant_id,
            vendor_id: actor.scope.vendor_id,
            actor: Some(actor.scope.subject_id),
            action: AuditAction::RoleDeleted,
            entity_type: "role".to_owned(),
            entity_id: Some(role_id.to_string()),
            target_subject: None,
            detail: Some(format!(
                "deleted role '{}' with priority {}",
                role.name, role.priority
            )),
            client: actor.client.clone(),
        })
        .await
    }

    /// Seeds missing default roles for the actor's tenant. Existing names are left untouched.
    pub async fn seed_default_roles(&self, actor: &Actor) -> AppResult<Vec<RoleDefinition>> {
        self.seed_tenant_default_roles(
            actor.scope.tenant_id,
            Some(actor.scope.subject_id),
            actor.client.clone(),
        )
        .await
    }

    /// Seeds missing default roles for a tenant on behalf of a trusted caller.
    ///
    /// Used for tenant bootstrap, when no subject holds a role yet.
    pub async fn seed_tenant_default_roles(
        &self,
        tenant_id: TenantId,
        actor: Option<SubjectId>,
        client: ClientMetadata,
    ) -> AppResult<Vec<RoleDefinition>> {
        let mut created = Vec::new();

        for template in default_role_templates() {
            let name = template.tier.role_name();
            if self
                .repository
                .find_role_by_name(tenant_id, None, name)
                .await?
                .is_some_and(|role| role.vendor_id.is_none())
            {
                continue;
            }

            let input = CreateRoleInput::from_template(&template)?;
            match self.repository.create_role(tenant_id, input).await {
                Ok(role) => created.push(role),
                Err(AppError::Conflict(_)) => {}
                Err(error) => return Err(error),
            }
        }

        if !created.is_empty() {
            let names: Vec<&str> = created.iter().map(|role| role.name.as_str()).collect();
            self.append_audit(AuditEvent {
                tenant_id,
                vendor_id: None,
                actor,
                action: AuditAction::DefaultRolesSeeded,
                entity_type: "tenant".to_owned(),
                entity_id: Some(tenant_id.to_string()),
                target_subject: None,
                detail: Some(format!("seeded roles: {}", names.join(", "))),
                client,
            })
            .await?;
        }

        Ok(created)
    }
}
