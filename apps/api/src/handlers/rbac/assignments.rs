use super::*;

pub async fn list_staff_roles_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(staff_id): Path<Uuid>,
) -> ApiResult<Json<Vec<RoleAssignmentResponse>>> {
    let assignments = state
        .role_admin_service
        .list_subject_assignments(&context.actor, SubjectId::from_uuid(staff_id))
        .await?
        .into_iter()
        .map(RoleAssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(staff_id): Path<Uuid>,
    Json(payload): Json<AssignStaffRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleAssignmentResponse>)> {
    let assignment = state
        .role_admin_service
        .assign_role(
            &context.actor,
            SubjectId::from_uuid(staff_id),
            payload.into(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoleAssignmentResponse::from(assignment)),
    ))
}

pub async fn remove_role_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path((staff_id, role_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .role_admin_service
        .remove_role(&context.actor, SubjectId::from_uuid(staff_id), role_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_primary_role_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path((staff_id, role_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .role_admin_service
        .set_primary_role(&context.actor, SubjectId::from_uuid(staff_id), role_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
