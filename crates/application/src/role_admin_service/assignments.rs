use super::*;

use chrono::{DateTime, Utc};
use staffguard_domain::{AuditAction, Capability};
use uuid::Uuid;

use crate::authorization_service::ensure_capability;
use crate::{AssignRoleInput, RemoveRoleAssignmentInput, RoleAssignment, SubjectScope};

/// Request payload for assigning a role to a staff member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRoleRequest {
    /// Role to assign.
    pub role_id: Uuid,
    /// Marks the assignment primary.
    pub is_primary: bool,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl RoleAdminService {
    /// Returns every assignment of a staff member.
    pub async fn list_subject_assignments(
        &self,
        actor: &Actor,
        subject_id: SubjectId,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.repository
            .list_subject_assignments(actor.scope.tenant_id, subject_id)
            .await
    }

    /// Assigns a role strictly below the actor's priority to another staff member.
    pub async fn assign_role(
        &self,
        actor: &Actor,
        subject_id: SubjectId,
        request: AssignRoleRequest,
    ) -> AppResult<RoleAssignment> {
        let actor_permissions = self.actor_permissions(actor).await?;
        ensure_capability(&actor_permissions, Capability::ManageStaff)?;

        if subject_id == actor.scope.subject_id {
            return Err(AppError::PolicyDenied {
                code: DenialCode::SelfAssignmentDenied,
                message: "cannot assign roles to yourself; ask another administrator".to_owned(),
            });
        }

        self.require_active_subject(actor, subject_id).await?;
        let role = self.require_role_in_scope(actor, request.role_id).await?;
        if !role.is_active {
            return Err(AppError::Validation(format!(
                "role '{}' is inactive and cannot be assigned",
                role.name
            )));
        }
        ensure_below_actor_priority(&actor_permissions, role.priority, "assign")?;

        if request
            .expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now())
        {
            return Err(AppError::Validation(
                "expires_at must be in the future".to_owned(),
            ));
        }

        let assignment = self
            .repository
            .assign_role(
                actor.scope.tenant_id,
                AssignRoleInput {
                    subject_id,
                    role_id: role.role_id,
                    vendor_id: actor.scope.vendor_id,
                    is_primary: request.is_primary,
                    expires_at: request.expires_at,
                    assigned_by: Some(actor.scope.subject_id),
                    notes: request.notes,
                },
            )
            .await?;

        self.authorization_service
            .invalidate_subject(&target_scope(actor, subject_id))
            .await;

        self.append_audit(AuditEvent {
            tenant_id: actor.scope.tenant_id,
            vendor_id: actor.scope.vendor_id,
            actor: Some(actor.scope.subject_id),
            action: AuditAction::RoleAssigned,
            entity_type: "staff".to_owned(),
            entity_id: Some(subject_id.to_string()),
            target_subject: Some(subject_id),
            detail: Some(format!("assigned role '{}'", role.name)),
            client: actor.client.clone(),
        })
        .await?;

        Ok(assignment)
    }

    /// Removes a role strictly below the actor's priority.
    ///
    /// Actors may remove their own lower roles, but never their last remaining one.
    pub async fn remove_role(
        &self,
        actor: &Actor,
        subject_id: SubjectId,
        role_id: Uuid,
    ) -> AppResult<()> {
        let actor_permissions = self.actor_permissions(actor).await?;
        ensure_capability(&actor_permissions, Capability::ManageStaff)?;

        let role = self.require_role_in_scope(actor, role_id).await?;
        ensure_below_actor_priority(&actor_permissions, role.priority, "remove")?;

        self.repository
            .remove_role_assignment(
                actor.scope.tenant_id,
                RemoveRoleAssignmentInput {
                    subject_id,
                    role_id,
                    vendor_id: actor.scope.vendor_id,
                    protect_last_role: subject_id == actor.scope.subject_id,
                },
            )
            .await?;

        self.authorization_service
            .invalidate_subject(&target_scope(actor, subject_id))
            .await;

        self.append_audit(AuditEvent {
            tenant_id: actor.scope.tenant_id,
            vendor_id: actor.scope.vendor_id,
            actor: Some(actor.scope.subject_id),
            action: AuditAction::RoleRemoved,
            entity_type: "staff".to_owned(),
            entity_id: Some(subject_id.to_string()),
            target_subject: Some(subject_id),
            detail: Some(format!("removed role '{}'", role.name)),
            client: actor.client.clone(),
        })
        .await
    }

    /// Marks one of a staff member's assignments primary.
    pub async fn set_primary_role(
        &self,
        actor: &Actor,
        subject_id: SubjectId,
        role_id: Uuid,
    ) -> AppResult<()> {
        let actor_permissions = self.actor_permissions(actor).await?;
        ensure_capability(&actor_permissions, Capability::ManageStaff)?;

        self.repository
            .set_primary_role(
                actor.scope.tenant_id,
                actor.scope.vendor_id,
                subject_id,
                role_id,
            )
            .await?;

        self.authorization_service
            .invalidate_subject(&target_scope(actor, subject_id))
            .await;

        self.append_audit(AuditEvent {
            tenant_id: actor.scope.tenant_id,
            vendor_id: actor.scope.vendor_id,
            actor: Some(actor.scope.subject_id),
            action: AuditAction::PrimaryRoleSet,
            entity_type: "staff".to_owned(),
            entity_id: Some(subject_id.to_string()),
            target_subject: Some(subject_id),
            detail: Some(format!("set primary role '{role_id}'")),
            client: actor.client.clone(),
        })
        .await
    }
}

fn target_scope(actor: &Actor, subject_id: SubjectId) -> SubjectScope {
    SubjectScope::new(actor.scope.tenant_id, actor.scope.vendor_id, subject_id)
}
