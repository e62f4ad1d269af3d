use super::*;

use staffguard_application::AuditLogQuery;

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Query(params): Query<AuditLogQueryParams>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    let query = AuditLogQuery::try_from(params)?;
    let entries = state
        .role_admin_service
        .list_audit_log(&context.actor, query)
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}
