use super::*;

impl PostgresRbacRepository {
    pub(super) async fn list_roles_impl(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
    ) -> AppResult<Vec<RoleDefinition>> {
        let query = format!(
            r#"{ROLE_SELECT}
            WHERE roles.tenant_id = $1
                AND (roles.vendor_id IS NULL OR roles.vendor_id = $2)
            GROUP BY roles.id
            ORDER BY roles.priority DESC, roles.name
            "#
        );

        let rows = sqlx::query_as::<_, RoleRow>(query.as_str())
            .bind(tenant_id.as_uuid())
            .bind(vendor_id.map(|vendor_id| vendor_id.as_uuid()))
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        Ok(rows.into_iter().map(RoleDefinition::from).collect())
    }

    pub(super) async fn find_role_impl(
        &self,
        tenant_id: TenantId,
        role_id: Uuid,
    ) -> AppResult<Option<RoleDefinition>> {
        let query = format!(
            r#"{ROLE_SELECT}
            WHERE roles.tenant_id = $1 AND roles.id = $2
            GROUP BY roles.id
            "#
        );

        let row = sqlx::query_as::<_, RoleRow>(query.as_str())
            .bind(tenant_id.as_uuid())
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to find role: {error}")))?;

        Ok(row.map(RoleDefinition::from))
    }

    pub(super) async fn find_role_by_name_impl(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
        name: &str,
    ) -> AppResult<Option<RoleDefinition>> {
        let query = format!(
            r#"{ROLE_SELECT}
            WHERE roles.tenant_id = $1
                AND (roles.vendor_id IS NULL OR roles.vendor_id = $2)
                AND roles.name = $3
            GROUP BY roles.id
            ORDER BY roles.vendor_id IS NULL
            LIMIT 1
            "#
        );

        let row = sqlx::query_as::<_, RoleRow>(query.as_str())
            .bind(tenant_id.as_uuid())
            .bind(vendor_id.map(|vendor_id| vendor_id.as_uuid()))
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to find role by name: {error}")))?;

        Ok(row.map(RoleDefinition::from))
    }

    pub(super) async fn create_role_impl(
        &self,
        tenant_id: TenantId,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let mut transaction = self.begin().await?;

        let (role_id, created_at) = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"
            INSERT INTO staff_roles (
                tenant_id,
                vendor_id,
                name,
                display_name,
                priority,
                is_system,
                can_manage_staff,
                can_create_roles,
                can_delete_roles
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, created_at
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(input.vendor_id.map(|vendor_id| vendor_id.as_uuid()))
        .bind(input.name.as_str())
        .bind(input.display_name.as_deref())
        .bind(input.priority)
        .bind(input.is_system)
        .bind(input.can_manage_staff)
        .bind(input.can_create_roles)
        .bind(input.can_delete_roles)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            map_unique_conflict(
                error,
                format!("role '{}' already exists", input.name.as_str()),
                "create role",
            )
        })?;

        insert_role_permissions(&mut transaction, role_id, &input.permissions).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        let mut permissions = input
            .permissions
            .iter()
            .map(|permission| permission.as_str().to_owned())
            .collect::<Vec<_>>();
        permissions.sort();
        permissions.dedup();

        Ok(RoleDefinition {
            role_id,
            tenant_id,
            vendor_id: input.vendor_id,
            name: input.name.as_str().to_owned(),
            display_name: input.display_name,
            priority: input.priority,
            is_system: input.is_system,
            is_active: true,
            can_manage_staff: input.can_manage_staff,
            can_create_roles: input.can_create_roles,
            can_delete_roles: input.can_delete_roles,
            permissions,
            created_at,
        })
    }

    pub(super) async fn set_role_permissions_impl(
        &self,
        tenant_id: TenantId,
        role_id: Uuid,
        permissions: &[PermissionName],
    ) -> AppResult<RoleDefinition> {
        let mut transaction = self.begin().await?;

        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM staff_roles
            WHERE tenant_id = $1 AND id = $2
            FOR UPDATE
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock role: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        sqlx::query(
            r#"
            DELETE FROM staff_role_permissions
            WHERE role_id = $1
            "#,
        )
        .bind(role_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear role grants: {error}")))?;

        insert_role_permissions(&mut transaction, role_id, permissions).await?;

        sqlx::query(
            r#"
            UPDATE staff_roles
            SET updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(role_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to touch role: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        self.find_role_impl(tenant_id, role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    pub(super) async fn update_role_impl(
        &self,
        tenant_id: TenantId,
        role_id: Uuid,
        input: &UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let updated = sqlx::query(
            r#"
            UPDATE staff_roles
            SET display_name = COALESCE($3, display_name),
                priority = COALESCE($4, priority),
                is_active = COALESCE($5, is_active),
                can_manage_staff = COALESCE($6, can_manage_staff),
                can_create_roles = COALESCE($7, can_create_roles),
                can_delete_roles = COALESCE($8, can_delete_roles),
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id)
        .bind(input.display_name.as_deref())
        .bind(input.priority)
        .bind(input.is_active)
        .bind(input.can_manage_staff)
        .bind(input.can_create_roles)
        .bind(input.can_delete_roles)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update role: {error}")))?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        self.find_role_impl(tenant_id, role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    /// Deactivates the role; assignments stay for the audit trail but stop granting.
    pub(super) async fn soft_delete_role_impl(
        &self,
        tenant_id: TenantId,
        role_id: Uuid,
    ) -> AppResult<()> {
        let deleted = sqlx::query(
            r#"
            UPDATE staff_roles
            SET is_active = FALSE, updated_at = now()
            WHERE tenant_id = $1 AND id = $2 AND is_active
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        Ok(())
    }
}
