use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use staffguard_application::{SubjectDirectory, SubjectRecord};
use staffguard_core::{AppError, AppResult, SubjectId, TenantId, VendorId};

/// PostgreSQL-backed staff directory.
#[derive(Clone)]
pub struct PostgresSubjectDirectory {
    pool: PgPool,
}

impl PostgresSubjectDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct StaffRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    vendor_id: Option<uuid::Uuid>,
    keycloak_user_id: Option<String>,
    email: String,
    is_active: bool,
    two_factor_enabled: bool,
}

impl From<StaffRow> for SubjectRecord {
    fn from(row: StaffRow) -> Self {
        Self {
            subject_id: SubjectId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            vendor_id: row.vendor_id.map(VendorId::from_uuid),
            provider_subject: row.keycloak_user_id,
            email: row.email,
            is_active: row.is_active,
            two_factor_enabled: row.two_factor_enabled,
        }
    }
}

#[async_trait]
impl SubjectDirectory for PostgresSubjectDirectory {
    async fn find_by_provider_subject(
        &self,
        tenant_id: TenantId,
        provider_subject: &str,
    ) -> AppResult<Option<SubjectRecord>> {
        let row = sqlx::query_as::<_, StaffRow>(
            r#"
            SELECT id, tenant_id, vendor_id, keycloak_user_id, email, is_active, two_factor_enabled
            FROM staff
            WHERE tenant_id = $1 AND keycloak_user_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(provider_subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve staff member: {error}")))?;

        Ok(row.map(SubjectRecord::from))
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        subject_id: SubjectId,
    ) -> AppResult<Option<SubjectRecord>> {
        let row = sqlx::query_as::<_, StaffRow>(
            r#"
            SELECT id, tenant_id, vendor_id, keycloak_user_id, email, is_active, two_factor_enabled
            FROM staff
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve staff member: {error}")))?;

        Ok(row.map(SubjectRecord::from))
    }
}
