use staffguard_application::{
    AssignRoleRequest, AuditLogEntry, AuditLogQuery, CreateRoleInput, RoleAssignment,
    RoleDefinition, UpdateRoleInput,
};
use staffguard_core::{AppError, NonEmptyString, SubjectId};
use staffguard_domain::{AuditAction, EffectivePermissions, PermissionName};

use super::types::{
    AssignStaffRoleRequest, AuditLogEntryResponse, AuditLogQueryParams, CreateRoleRequest,
    EffectivePermissionsResponse, EffectiveRoleResponse, RoleAssignmentResponse, RoleResponse,
    UpdateRoleRequest,
};

impl From<EffectivePermissions> for EffectivePermissionsResponse {
    fn from(value: EffectivePermissions) -> Self {
        Self {
            staff_id: value.subject_id.as_uuid(),
            tenant_id: value.tenant_id.as_uuid(),
            vendor_id: value.vendor_id.map(|vendor_id| vendor_id.as_uuid()),
            roles: value
                .roles
                .into_iter()
                .map(|role| EffectiveRoleResponse {
                    role_id: role.role_id,
                    name: role.name,
                    priority: role.priority,
                    is_primary: role.is_primary,
                    via_team: role.via_team,
                })
                .collect(),
            permissions: value.permissions.into_iter().collect(),
            max_priority: value.max_priority,
            can_manage_staff: value.can_manage_staff,
            can_create_roles: value.can_create_roles,
            can_delete_roles: value.can_delete_roles,
        }
    }
}

impl From<RoleDefinition> for RoleResponse {
    fn from(value: RoleDefinition) -> Self {
        Self {
            role_id: value.role_id,
            vendor_id: value.vendor_id.map(|vendor_id| vendor_id.as_uuid()),
            name: value.name,
            display_name: value.display_name,
            priority: value.priority,
            is_system: value.is_system,
            is_active: value.is_active,
            can_manage_staff: value.can_manage_staff,
            can_create_roles: value.can_create_roles,
            can_delete_roles: value.can_delete_roles,
            permissions: value.permissions,
            created_at: value.created_at,
        }
    }
}

impl From<RoleAssignment> for RoleAssignmentResponse {
    fn from(value: RoleAssignment) -> Self {
        Self {
            assignment_id: value.assignment_id,
            staff_id: value.subject_id.as_uuid(),
            role_id: value.role_id,
            role_name: value.role_name,
            role_priority: value.role_priority,
            vendor_id: value.vendor_id.map(|vendor_id| vendor_id.as_uuid()),
            is_primary: value.is_primary,
            is_active: value.is_active,
            expires_at: value.expires_at,
            assigned_by: value.assigned_by.map(|subject_id| subject_id.as_uuid()),
            notes: value.notes,
            assigned_at: value.assigned_at,
        }
    }
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(value: AuditLogEntry) -> Self {
        Self {
            event_id: value.event_id,
            vendor_id: value.vendor_id.map(|vendor_id| vendor_id.as_uuid()),
            actor_id: value.actor.map(|subject_id| subject_id.as_uuid()),
            action: value.action,
            entity_type: value.entity_type,
            entity_id: value.entity_id,
            target_staff_id: value.target_subject.map(|subject_id| subject_id.as_uuid()),
            detail: value.detail,
            ip_address: value.ip_address,
            user_agent: value.user_agent,
            created_at: value.created_at,
        }
    }
}

impl TryFrom<CreateRoleRequest> for CreateRoleInput {
    type Error = AppError;

    fn try_from(value: CreateRoleRequest) -> Result<Self, Self::Error> {
        let permissions = value
            .permissions
            .into_iter()
            .map(PermissionName::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            vendor_id: None,
            name: NonEmptyString::new(value.name.trim())?,
            display_name: value
                .display_name
                .map(|display_name| display_name.trim().to_owned())
                .filter(|display_name| !display_name.is_empty()),
            priority: value.priority,
            is_system: false,
            can_manage_staff: value.can_manage_staff,
            can_create_roles: value.can_create_roles,
            can_delete_roles: value.can_delete_roles,
            permissions,
        })
    }
}

impl From<UpdateRoleRequest> for UpdateRoleInput {
    fn from(value: UpdateRoleRequest) -> Self {
        Self {
            display_name: value
                .display_name
                .map(|display_name| display_name.trim().to_owned())
                .filter(|display_name| !display_name.is_empty()),
            priority: value.priority,
            is_active: value.is_active,
            can_manage_staff: value.can_manage_staff,
            can_create_roles: value.can_create_roles,
            can_delete_roles: value.can_delete_roles,
        }
    }
}

impl From<AssignStaffRoleRequest> for AssignRoleRequest {
    fn from(value: AssignStaffRoleRequest) -> Self {
        Self {
            role_id: value.role_id,
            is_primary: value.is_primary,
            expires_at: value.expires_at,
            notes: value.notes,
        }
    }
}

impl TryFrom<AuditLogQueryParams> for AuditLogQuery {
    type Error = AppError;

    fn try_from(value: AuditLogQueryParams) -> Result<Self, Self::Error> {
        let action = value
            .action
            .as_deref()
            .map(|action| {
                AuditAction::parse(action).ok_or_else(|| {
                    AppError::Validation(format!("unknown audit action '{action}'"))
                })
            })
            .transpose()?;
        let defaults = Self::default();

        Ok(Self {
            from: value.from,
            to: value.to,
            action,
            actor: value.actor_id.map(SubjectId::from_uuid),
            limit: value.limit.unwrap_or(defaults.limit),
            offset: value.offset.unwrap_or(defaults.offset),
        })
    }
}
