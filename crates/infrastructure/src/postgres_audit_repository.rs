use async_trait::async_trait;
use sqlx::PgPool;

use staffguard_application::{AuditEvent, AuditRepository};
use staffguard_core::{AppError, AppResult};

/// PostgreSQL-backed append-only RBAC audit repository.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO staff_rbac_audit_log (
                tenant_id,
                vendor_id,
                actor_id,
                action,
                entity_type,
                entity_id,
                target_staff_id,
                detail,
                ip_address,
                user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(event.tenant_id.as_uuid())
        .bind(event.vendor_id.map(|vendor_id| vendor_id.as_uuid()))
        .bind(event.actor.map(|actor| actor.as_uuid()))
        .bind(event.action.as_str())
        .bind(event.entity_type)
        .bind(event.entity_id)
        .bind(event.target_subject.map(|subject| subject.as_uuid()))
        .bind(event.detail)
        .bind(event.client.ip_address)
        .bind(event.client.user_agent)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

        Ok(())
    }
}
