use super::*;

/// Sets the role every member of the team inherits, or clears it with a null `role_id`.
pub async fn set_team_default_role_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(team_id): Path<Uuid>,
    Json(payload): Json<SetTeamDefaultRoleRequest>,
) -> ApiResult<StatusCode> {
    state
        .role_admin_service
        .set_team_default_role(&context.actor, team_id, payload.role_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
