use super::*;

impl PostgresRbacRepository {
    pub(super) async fn list_role_grants_impl(
        &self,
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
        subject_id: SubjectId,
    ) -> AppResult<Vec<RoleGrant>> {
        let rows = sqlx::query_as::<_, RoleGrantRow>(
            r#"
            SELECT
                assignments.id AS assignment_id,
                roles.id AS role_id,
                roles.name AS role_name,
                roles.priority,
                assignments.vendor_id,
                assignments.is_active AS assignment_is_active,
                roles.is_active AS role_is_active,
                assignments.expires_at,
                assignments.is_primary,
                roles.can_manage_staff,
                roles.can_create_roles,
                roles.can_delete_roles,
                FALSE AS via_team,
                COALESCE(
                    array_agg(grants.permission ORDER BY grants.permission)
                        FILTER (WHERE grants.permission IS NOT NULL),
                    ARRAY[]::TEXT[]
                ) AS permissions
            FROM staff_role_assignments AS assignments
            INNER JOIN staff AS members
                ON members.id = assignments.staff_id
                AND members.is_active
            INNER JOIN staff_roles AS roles
                ON roles.id = assignments.role_id
            LEFT JOIN staff_role_permissions AS grants
                ON grants.role_id = roles.id
            WHERE assignments.tenant_id = $1
                AND assignments.staff_id = $2
                AND assignments.is_active
                AND roles.is_active
                AND (assignments.expires_at IS NULL OR assignments.expires_at > now())
                AND (assignments.vendor_id IS NULL OR assignments.vendor_id = $3)
            GROUP BY assignments.id, roles.id

            UNION ALL

            SELECT
                teams.id AS assignment_id,
                roles.id AS role_id,
                roles.name AS role_name,
                roles.priority,
                teams.vendor_id,
                TRUE AS assignment_is_active,
                roles.is_active AS role_is_active,
                NULL::TIMESTAMPTZ AS expires_at,
                FALSE AS is_primary,
                roles.can_manage_staff,
                roles.can_create_roles,
                roles.can_delete_roles,
                TRUE AS via_team,
                COALESCE(
                    array_agg(grants.permission ORDER BY grants.permission)
                        FILTER (WHERE grants.permission IS NOT NULL),
                    ARRAY[]::TEXT[]
                ) AS permissions
            FROM staff AS members
            INNER JOIN staff_teams AS teams
                ON teams.id = members.team_id
                AND teams.tenant_id = members.tenant_id
            INNER JOIN staff_roles AS roles
                ON roles.id = teams.default_role_id
                AND roles.tenant_id = teams.tenant_id
            LEFT JOIN staff_role_permissions AS grants
                ON grants.role_id = roles.id
            WHERE members.tenant_id = $1
                AND members.id = $2
                AND members.is_active
                AND roles.is_active
                AND (teams.vendor_id IS NULL OR teams.vendor_id = $3)
            GROUP BY teams.id, roles.id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject_id.as_uuid())
        .bind(vendor_id.map(|vendor_id| vendor_id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role grants: {error}")))?;

        Ok(rows.into_iter().map(RoleGrant::from).collect())
    }
}
