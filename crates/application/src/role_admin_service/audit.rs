use super::*;

use crate::{AuditLogEntry, AuditLogQuery};

const MAX_AUDIT_PAGE_SIZE: usize = 200;

impl RoleAdminService {
    /// Returns tenant audit entries, newest first.
    pub async fn list_audit_log(
        &self,
        actor: &Actor,
        mut query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        if let (Some(from), Some(to)) = (query.from, query.to)
            && from >= to
        {
            return Err(AppError::Validation(
                "audit range start must be before its end".to_owned(),
            ));
        }

        query.limit = query.limit.clamp(1, MAX_AUDIT_PAGE_SIZE);

        self.audit_log_repository
            .list_entries(actor.scope.tenant_id, query)
            .await
    }
}
