use super::*;

impl PostgresRbacRepository {
    pub(super) async fn list_subject_assignments_impl(
        &self,
        tenant_id: TenantId,
        subject_id: SubjectId,
    ) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT
                assignments.id AS assignment_id,
                assignments.staff_id,
                assignments.role_id,
                roles.name AS role_name,
                roles.priority AS role_priority,
                assignments.vendor_id,
                assignments.is_primary,
                assignments.is_active,
                assignments.expires_at,
                assignments.assigned_by,
                assignments.notes,
                assignments.assigned_at
            FROM staff_role_assignments AS assignments
            INNER JOIN staff_roles AS roles
                ON roles.id = assignments.role_id
            WHERE assignments.tenant_id = $1
                AND assignments.staff_id = $2
            ORDER BY assignments.vendor_id NULLS FIRST, roles.priority DESC, roles.name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role assignments: {error}"))
        })?;

        Ok(rows.into_iter().map(RoleAssignment::from).collect())
    }

    pub(super) async fn assign_role_impl(
        &self,
        tenant_id: TenantId,
        input: AssignRoleInput,
    ) -> AppResult<RoleAssignment> {
        let mut transaction = self.begin().await?;
        lock_staff_row(&mut transaction, tenant_id, input.subject_id).await?;

        let (role_name, role_priority) = sqlx::query_as::<_, (String, i32)>(
            r#"
            SELECT name, priority
            FROM staff_roles
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(input.role_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("role '{}' was not found", input.role_id)))?;

        let vendor_id = input.vendor_id.map(|vendor_id| vendor_id.as_uuid());
        if input.is_primary {
            clear_primary_flags(&mut transaction, input.subject_id, vendor_id).await?;
        }

        let (assignment_id, assigned_at) = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"
            INSERT INTO staff_role_assignments (
                tenant_id,
                vendor_id,
                staff_id,
                role_id,
                is_primary,
                expires_at,
                assigned_by,
                notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, assigned_at
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(vendor_id)
        .bind(input.subject_id.as_uuid())
        .bind(input.role_id)
        .bind(input.is_primary)
        .bind(input.expires_at)
        .bind(input.assigned_by.map(|subject_id| subject_id.as_uuid()))
        .bind(input.notes.as_deref())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            map_unique_conflict(
                error,
                format!("role '{role_name}' is already assigned"),
                "assign role",
            )
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(RoleAssignment {
            assignment_id,
            subject_id: input.subject_id,
            role_id: input.role_id,
            role_name,
            role_priority,
            vendor_id: input.vendor_id,
            is_primary: input.is_primary,
            is_active: true,
            expires_at: input.expires_at,
            assigned_by: input.assigned_by,
            notes: input.notes,
            assigned_at,
        })
    }

    pub(super) async fn remove_role_assignment_impl(
        &self,
        tenant_id: TenantId,
        input: RemoveRoleAssignmentInput,
    ) -> AppResult<()> {
        let mut transaction = self.begin().await?;
        lock_staff_row(&mut transaction, tenant_id, input.subject_id).await?;

        let vendor_id = input.vendor_id.map(|vendor_id| vendor_id.as_uuid());
        let assignment_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM staff_role_assignments
            WHERE tenant_id = $1
                AND staff_id = $2
                AND role_id = $3
                AND vendor_id IS NOT DISTINCT FROM $4
                AND is_active
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(input.subject_id.as_uuid())
        .bind(input.role_id)
        .bind(vendor_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role assignment: {error}")))?
        .ok_or_else(|| AppError::NotFound("role assignment was not found".to_owned()))?;

        if input.protect_last_role {
            let active_in_scope = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*)
                FROM staff_role_assignments
                WHERE staff_id = $1
                    AND vendor_id IS NOT DISTINCT FROM $2
                    AND is_active
                    AND (expires_at IS NULL OR expires_at > now())
                "#,
            )
            .bind(input.subject_id.as_uuid())
            .bind(vendor_id)
            .fetch_one(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to count role assignments: {error}"))
            })?;

            if active_in_scope <= 1 {
                return Err(last_role_denied());
            }
        }

        sqlx::query(
            r#"
            DELETE FROM staff_role_assignments
            WHERE id = $1
            "#,
        )
        .bind(assignment_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to remove role assignment: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    pub(super) async fn set_primary_role_impl(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
        subject_id: SubjectId,
        role_id: Uuid,
    ) -> AppResult<()> {
        let mut transaction = self.begin().await?;
        lock_staff_row(&mut transaction, tenant_id, subject_id).await?;

        let vendor_id = vendor_id.map(|vendor_id| vendor_id.as_uuid());
        let assignment_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM staff_role_assignments
            WHERE tenant_id = $1
                AND staff_id = $2
                AND role_id = $3
                AND vendor_id IS NOT DISTINCT FROM $4
                AND is_active
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject_id.as_uuid())
        .bind(role_id)
        .bind(vendor_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role assignment: {error}")))?
        .ok_or_else(|| AppError::NotFound("role assignment was not found".to_owned()))?;

        clear_primary_flags(&mut transaction, subject_id, vendor_id).await?;

        sqlx::query(
            r#"
            UPDATE staff_role_assignments
            SET is_primary = TRUE, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(assignment_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to set primary role: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    pub(super) async fn deactivate_expired_assignments_impl(&self) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE staff_role_assignments
            SET is_active = FALSE, is_primary = FALSE, updated_at = now()
            WHERE is_active
                AND expires_at IS NOT NULL
                AND expires_at <= now()
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to deactivate expired assignments: {error}"))
        })?;

        Ok(result.rows_affected())
    }
}

/// Serializes assignment mutations of one staff member.
async fn lock_staff_row(
    transaction: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
    subject_id: SubjectId,
) -> AppResult<()> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
        FROM staff
        WHERE tenant_id = $1 AND id = $2
        FOR UPDATE
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(subject_id.as_uuid())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to lock staff member: {error}")))?
    .ok_or_else(|| AppError::NotFound(format!("staff member '{subject_id}' was not found")))?;

    Ok(())
}

async fn clear_primary_flags(
    transaction: &mut Transaction<'_, Postgres>,
    subject_id: SubjectId,
    vendor_id: Option<Uuid>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE staff_role_assignments
        SET is_primary = FALSE, updated_at = now()
        WHERE staff_id = $1
            AND vendor_id IS NOT DISTINCT FROM $2
            AND is_primary
        "#,
    )
    .bind(subject_id.as_uuid())
    .bind(vendor_id)
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to clear primary roles: {error}")))?;

    Ok(())
}
