use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use staffguard_application::SubjectScope;
use staffguard_core::{AppError, SubjectId, TenantId, VendorId};
use uuid::Uuid;

use crate::dto::{
    AuthorizeRequest, AuthorizeResponse, EffectivePermissionsResponse, InternalScopeQuery,
    RoleResponse,
};
use crate::error::ApiResult;
use crate::middleware::client_metadata;
use crate::state::AppState;

/// Resolves the permission set of a staff member for another service.
pub async fn effective_permissions_handler(
    State(state): State<AppState>,
    Path(staff_id): Path<Uuid>,
    Query(query): Query<InternalScopeQuery>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let scope = SubjectScope::new(
        TenantId::from_uuid(query.tenant_id),
        query.vendor_id.map(VendorId::from_uuid),
        SubjectId::from_uuid(staff_id),
    );
    let permissions = state.authorization_service.permissions_or_deny(&scope).await?;

    Ok(Json(EffectivePermissionsResponse::from(permissions)))
}

/// Answers one permission question for another service without auditing denials.
pub async fn authorize_handler(
    State(state): State<AppState>,
    Json(payload): Json<AuthorizeRequest>,
) -> ApiResult<Json<AuthorizeResponse>> {
    let has_permission_check = payload.permission.is_some() || !payload.any_of.is_empty();
    if !has_permission_check && payload.min_priority.is_none() {
        return Err(AppError::Validation(
            "one of permission, any_of or min_priority is required".to_owned(),
        )
        .into());
    }
    if payload.permission.is_some() && !payload.any_of.is_empty() {
        return Err(AppError::Validation(
            "permission and any_of are mutually exclusive".to_owned(),
        )
        .into());
    }

    let scope = SubjectScope::new(
        TenantId::from_uuid(payload.tenant_id),
        payload.vendor_id.map(VendorId::from_uuid),
        SubjectId::from_uuid(payload.staff_id),
    );
    let permissions = match state.authorization_service.effective_permissions(&scope).await {
        Ok(permissions) => permissions,
        Err(error) => {
            tracing::error!(
                scope = %scope,
                error = %error,
                "internal authorize could not resolve permissions"
            );
            return Ok(Json(AuthorizeResponse {
                allowed: false,
                max_priority: 0,
            }));
        }
    };

    let permission_allowed = match payload.permission.as_deref() {
        Some(permission) => permissions.authorizes(permission),
        None if payload.any_of.is_empty() => true,
        None => {
            let any_of: Vec<&str> = payload.any_of.iter().map(String::as_str).collect();
            permissions.authorizes_any(&any_of)
        }
    };
    let priority_allowed = payload
        .min_priority
        .is_none_or(|minimum| permissions.meets_priority(minimum));

    Ok(Json(AuthorizeResponse {
        allowed: permission_allowed && priority_allowed,
        max_priority: permissions.max_priority,
    }))
}

/// Seeds the default role catalog of a freshly provisioned tenant.
pub async fn seed_tenant_roles_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<(StatusCode, Json<Vec<RoleResponse>>)> {
    let roles = state
        .role_admin_service
        .seed_tenant_default_roles(TenantId::from_uuid(tenant_id), None, client_metadata(&headers))
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok((StatusCode::CREATED, Json(roles)))
}
