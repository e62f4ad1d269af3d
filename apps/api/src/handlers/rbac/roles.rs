use super::*;

use staffguard_application::CreateRoleInput;
use staffguard_domain::PermissionName;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_admin_service
        .list_roles(&context.actor)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let input = CreateRoleInput::try_from(payload)?;
    let role = state
        .role_admin_service
        .create_role(&context.actor, input)
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .role_admin_service
        .update_role(&context.actor, role_id, payload.into())
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .role_admin_service
        .delete_role(&context.actor, role_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_role_permissions_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<SetRolePermissionsRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let permissions = payload
        .permissions
        .into_iter()
        .map(PermissionName::new)
        .collect::<Result<Vec<_>, _>>()?;

    let role = state
        .role_admin_service
        .set_role_permissions(&context.actor, role_id, permissions)
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn seed_default_roles_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_admin_service
        .seed_default_roles(&context.actor)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}
