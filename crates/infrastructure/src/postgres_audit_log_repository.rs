use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use staffguard_application::{AuditLogEntry, AuditLogQuery, AuditLogRepository};
use staffguard_core::{AppError, AppResult, SubjectId, TenantId, VendorId};


/// PostgreSQL-backed repository for RBAC audit log read models.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    event_id: uuid::Uuid,
    vendor_id: Option<uuid::Uuid>,
    actor_id: Option<uuid::Uuid>,
    action: String,
    entity_type: String,
    entity_id: Option<String>,
    target_staff_id: Option<uuid::Uuid>,
    detail: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let capped_limit = query.limit.clamp(1, 200) as i64;
        let capped_offset = query.offset.min(5_000) as i64;
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT
                id AS event_id,
                vendor_id,
                actor_id,
                action,
                entity_type,
                entity_id,
                target_staff_id,
                detail,
                ip_address,
                user_agent,
                created_at
            FROM staff_rbac_audit_log
            WHERE tenant_id = $1
                AND ($2::TIMESTAMPTZ IS NULL OR created_at >= $2)
                AND ($3::TIMESTAMPTZ IS NULL OR created_at < $3)
                AND ($4::TEXT IS NULL OR action = $4)
                AND ($5::UUID IS NULL OR actor_id = $5)
            ORDER BY created_at DESC, id
            LIMIT $6
            OFFSET $7
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(query.from)
        .bind(query.to)
        .bind(query.action.map(|action| action.as_str()))
        .bind(query.actor.map(|actor| actor.as_uuid()))
        .bind(capped_limit)
        .bind(capped_offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit log entries: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| AuditLogEntry {
                event_id: row.event_id,
                vendor_id: row.vendor_id.map(VendorId::from_uuid),
                actor: row.actor_id.map(SubjectId::from_uuid),
                action: row.action,
                entity_type: row.entity_type,
                entity_id: row.entity_id,
                target_subject: row.target_staff_id.map(SubjectId::from_uuid),
                detail: row.detail,
                ip_address: row.ip_address,
                user_agent: row.user_agent,
                created_at: row.created_at,
            })
            .collect())
    }
}
