use super::*;

pub async fn my_permissions_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let permissions = state
        .authorization_service
        .permissions_or_deny(&context.actor.scope)
        .await?;

    Ok(Json(EffectivePermissionsResponse::from(permissions)))
}
