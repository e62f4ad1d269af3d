use super::*;

impl PostgresRbacRepository {
    pub(super) async fn set_team_default_role_impl(
        &self,
        tenant_id: TenantId,
        team_id: Uuid,
        role_id: Option<Uuid>,
    ) -> AppResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE staff_teams
            SET default_role_id = $3, updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(team_id)
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to set team default role: {error}"))
        })?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("team '{team_id}' was not found")));
        }

        Ok(())
    }
}
