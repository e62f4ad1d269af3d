use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use staffguard_core::{SubjectId, TenantId, VendorId};
use uuid::Uuid;

use crate::permission::permission_grants;
use crate::role::Capability;

/// One role assignment joined with its role, as loaded from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    /// Assignment identifier.
    pub assignment_id: Uuid,
    /// Assigned role identifier.
    pub role_id: Uuid,
    /// Assigned role name.
    pub role_name: String,
    /// Role priority.
    pub priority: i32,
    /// Vendor scope of the assignment; `None` means tenant-wide.
    pub vendor_id: Option<VendorId>,
    /// Assignment active flag.
    pub assignment_is_active: bool,
    /// Role active flag.
    pub role_is_active: bool,
    /// Optional assignment expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Primary assignment flag. Display only.
    pub is_primary: bool,
    /// Role may manage staff.
    pub can_manage_staff: bool,
    /// Role may create roles.
    pub can_create_roles: bool,
    /// Role may delete roles.
    pub can_delete_roles: bool,
    /// Permission names granted by the role.
    pub permissions: Vec<String>,
    /// Inherited as the default role of the subject's team rather than assigned.
    ///
    /// Team grants add permissions and capability flags but never raise max priority.
    pub via_team: bool,
}

impl RoleGrant {
    /// Returns whether the grant contributes permissions at `now` in the given scope.
    #[must_use]
    pub fn is_effective(&self, vendor_id: Option<VendorId>, now: DateTime<Utc>) -> bool {
        let in_scope = match self.vendor_id {
            None => true,
            Some(grant_vendor) => vendor_id == Some(grant_vendor),
        };

        in_scope
            && self.assignment_is_active
            && self.role_is_active
            && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

/// Role summary carried inside effective permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRole {
    /// Role identifier.
    pub role_id: Uuid,
    /// Role name.
    pub name: String,
    /// Role priority.
    pub priority: i32,
    /// Whether one of the contributing assignments is primary.
    pub is_primary: bool,
    /// Held only through the subject's team default role.
    #[serde(default)]
    pub via_team: bool,
}

/// Resolved permission set of one subject in one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissions {
    /// Subject the set was resolved for.
    pub subject_id: SubjectId,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Vendor scope, if any.
    pub vendor_id: Option<VendorId>,
    /// Contributing roles, highest priority first.
    pub roles: Vec<EffectiveRole>,
    /// De-duplicated permission names.
    pub permissions: BTreeSet<String>,
    /// Highest role priority, zero without roles.
    pub max_priority: i32,
    /// Subject may manage other staff.
    pub can_manage_staff: bool,
    /// Subject may create roles.
    pub can_create_roles: bool,
    /// Subject may delete roles.
    pub can_delete_roles: bool,
}

impl EffectivePermissions {
    /// Creates the empty set that every check denies.
    #[must_use]
    pub fn empty(tenant_id: TenantId, vendor_id: Option<VendorId>, subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            tenant_id,
            vendor_id,
            roles: Vec::new(),
            permissions: BTreeSet::new(),
            max_priority: 0,
            can_manage_staff: false,
            can_create_roles: false,
            can_delete_roles: false,
        }
    }

    /// Returns whether no permission is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Evaluates a requested permission: exact match first, then trailing wildcards.
    #[must_use]
    pub fn authorizes(&self, requested: &str) -> bool {
        if self.permissions.contains(requested) {
            return true;
        }

        self.permissions
            .iter()
            .any(|granted| permission_grants(granted, requested))
    }

    /// Returns whether any of the requested permissions is authorized.
    #[must_use]
    pub fn authorizes_any(&self, requested: &[&str]) -> bool {
        requested.iter().any(|permission| self.authorizes(permission))
    }

    /// Returns the derived capability flag.
    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageStaff => self.can_manage_staff,
            Capability::CreateRoles => self.can_create_roles,
            Capability::DeleteRoles => self.can_delete_roles,
        }
    }

    /// Returns whether the subject's highest priority reaches `minimum`.
    #[must_use]
    pub fn meets_priority(&self, minimum: i32) -> bool {
        self.max_priority >= minimum
    }
}

/// Aggregates role grants into effective permissions.
///
/// Grants outside the requested scope, inactive grants, grants of inactive roles and
/// grants expiring at or before `now` are discarded. The result does not depend on the
/// order of `grants` or on duplicated assignments of the same role.
#[must_use]
pub fn resolve_effective_permissions(
    tenant_id: TenantId,
    vendor_id: Option<VendorId>,
    subject_id: SubjectId,
    grants: &[RoleGrant],
    now: DateTime<Utc>,
) -> EffectivePermissions {
    let mut resolved = EffectivePermissions::empty(tenant_id, vendor_id, subject_id);
    let mut roles: BTreeMap<Uuid, EffectiveRole> = BTreeMap::new();
    let mut role_flags = (false, false, false);

    for grant in grants
        .iter()
        .filter(|grant| grant.is_effective(vendor_id, now))
    {
        roles
            .entry(grant.role_id)
            .and_modify(|role| {
                role.is_primary |= grant.is_primary;
                role.via_team &= grant.via_team;
            })
            .or_insert_with(|| EffectiveRole {
                role_id: grant.role_id,
                name: grant.role_name.clone(),
                priority: grant.priority,
                is_primary: grant.is_primary,
                via_team: grant.via_team,
            });

        if !grant.via_team {
            resolved.max_priority = resolved.max_priority.max(grant.priority);
        }
        role_flags.0 |= grant.can_manage_staff;
        role_flags.1 |= grant.can_create_roles;
        role_flags.2 |= grant.can_delete_roles;
        resolved
            .permissions
            .extend(grant.permissions.iter().cloned());
    }

    let mut roles: Vec<EffectiveRole> = roles.into_values().collect();
    roles.sort_by(|left, right| {
        right
            .priority
            .cmp(&left.priority)
            .then_with(|| left.name.cmp(&right.name))
            .then_with(|| left.role_id.cmp(&right.role_id))
    });
    resolved.roles = roles;

    resolved.can_manage_staff =
        role_flags.0 || resolved.authorizes(Capability::ManageStaff.implied_by());
    resolved.can_create_roles =
        role_flags.1 || resolved.authorizes(Capability::CreateRoles.implied_by());
    resolved.can_delete_roles =
        role_flags.2 || resolved.authorizes(Capability::DeleteRoles.implied_by());

    resolved
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use proptest::prelude::*;
    use staffguard_core::{SubjectId, TenantId, VendorId};
    use uuid::Uuid;

    use crate::Capability;

    use super::{EffectivePermissions, RoleGrant, resolve_effective_permissions};

    fn grant(role_name: &str, priority: i32, permissions: &[&str]) -> RoleGrant {
        RoleGrant {
            assignment_id: Uuid::new_v4(),
            role_id: role_id_for(role_name),
            role_name: role_name.to_owned(),
            priority,
            vendor_id: None,
            assignment_is_active: true,
            role_is_active: true,
            expires_at: None,
            is_primary: false,
            can_manage_staff: false,
            can_create_roles: false,
            can_delete_roles: false,
            permissions: permissions.iter().map(|value| (*value).to_owned()).collect(),
            via_team: false,
        }
    }

    fn role_id_for(role_name: &str) -> Uuid {
        Uuid::from_u128(role_name.bytes().fold(7_u128, |hash, byte| {
            hash.wrapping_mul(31).wrapping_add(u128::from(byte))
        }))
    }

    fn resolve(grants: &[RoleGrant]) -> EffectivePermissions {
        resolve_effective_permissions(
            TenantId::from_uuid(Uuid::nil()),
            None,
            SubjectId::from_uuid(Uuid::nil()),
            grants,
            Utc::now(),
        )
    }

    #[test]
    fn subject_without_assignments_is_denied_everything() {
        let resolved = resolve(&[]);
        assert!(resolved.is_empty());
        assert_eq!(resolved.max_priority, 0);
        assert!(!resolved.authorizes("staff:read"));
        assert!(!resolved.has_capability(Capability::ManageStaff));
    }

    #[test]
    fn expired_assignment_is_excluded_even_when_marked_active() {
        let mut expired = grant("auditor", 30, &["audit:read"]);
        expired.expires_at = Some(Utc::now() - Duration::minutes(1));
        let current = grant("viewer", 10, &["staff:read"]);

        let resolved = resolve(&[expired, current]);

        assert!(!resolved.authorizes("audit:read"));
        assert!(resolved.authorizes("staff:read"));
        assert_eq!(resolved.max_priority, 10);
    }

    #[test]
    fn future_expiry_still_contributes() {
        let mut temporary = grant("auditor", 30, &["audit:read"]);
        temporary.expires_at = Some(Utc::now() + Duration::hours(1));

        assert!(resolve(&[temporary]).authorizes("audit:read"));
    }

    #[test]
    fn inactive_role_contributes_nothing() {
        let mut disabled = grant("manager", 30, &["staff:update"]);
        disabled.role_is_active = false;

        assert!(resolve(&[disabled]).is_empty());
    }

    #[test]
    fn vendor_scoped_grant_only_applies_inside_its_vendor() {
        let vendor_id = VendorId::new();
        let mut vendor_grant = grant("vendor_manager", 30, &["documents:verify"]);
        vendor_grant.vendor_id = Some(vendor_id);
        let tenant_grant = grant("viewer", 10, &["staff:read"]);
        let grants = [vendor_grant, tenant_grant];
        let tenant_id = TenantId::new();
        let subject_id = SubjectId::new();

        let inside = resolve_effective_permissions(
            tenant_id,
            Some(vendor_id),
            subject_id,
            &grants,
            Utc::now(),
        );
        let tenant_wide =
            resolve_effective_permissions(tenant_id, None, subject_id, &grants, Utc::now());
        let other_vendor = resolve_effective_permissions(
            tenant_id,
            Some(VendorId::new()),
            subject_id,
            &grants,
            Utc::now(),
        );

        assert!(inside.authorizes("documents:verify"));
        assert!(inside.authorizes("staff:read"));
        assert!(!tenant_wide.authorizes("documents:verify"));
        assert!(!other_vendor.authorizes("documents:verify"));
        assert!(other_vendor.authorizes("staff:read"));
    }

    #[test]
    fn staff_wildcard_authorizes_staff_actions_only() {
        let resolved = resolve(&[grant("staff_admin", 40, &["staff:*"])]);

        assert!(resolved.authorizes("staff:read"));
        assert!(resolved.authorizes("staff:update"));
        assert!(resolved.authorizes("staff:export"));
        assert!(!resolved.authorizes("audit:read"));
    }

    #[test]
    fn capability_flags_follow_role_flags_and_permissions() {
        let mut flagged = grant("lead", 30, &["teams:read"]);
        flagged.can_create_roles = true;
        let staff_admin = grant("staff_admin", 40, &["staff:*"]);

        let resolved = resolve(&[flagged, staff_admin]);

        assert!(resolved.can_create_roles);
        assert!(resolved.can_manage_staff);
        assert!(!resolved.can_delete_roles);
    }

    #[test]
    fn team_default_role_adds_permissions_but_not_priority() {
        let mut team_role = grant("support_lead", 40, &["documents:verify"]);
        team_role.via_team = true;
        team_role.can_manage_staff = true;
        let assigned = grant("viewer", 10, &["staff:read"]);

        let resolved = resolve(&[team_role.clone(), assigned]);

        assert!(resolved.authorizes("documents:verify"));
        assert!(resolved.authorizes("staff:read"));
        assert!(resolved.can_manage_staff);
        assert_eq!(resolved.max_priority, 10);
        assert!(resolved.roles.iter().any(|role| role.via_team && role.priority == 40));

        let mut direct = team_role.clone();
        direct.via_team = false;
        let both = resolve(&[team_role, direct]);
        assert_eq!(both.roles.len(), 1);
        assert!(!both.roles[0].via_team);
        assert_eq!(both.max_priority, 40);
    }

    #[test]
    fn duplicate_assignments_collapse_to_one_role() {
        let first = grant("viewer", 10, &["staff:read"]);
        let mut second = grant("viewer", 10, &["staff:read"]);
        second.is_primary = true;

        let resolved = resolve(&[first, second]);

        assert_eq!(resolved.roles.len(), 1);
        assert!(resolved.roles[0].is_primary);
        assert_eq!(resolved.permissions.len(), 1);
    }

    #[test]
    fn effective_permissions_survive_cache_serialization() {
        let resolved = resolve(&[grant("owner", 50, &["staff:*", "roles:*"])]);
        let encoded = serde_json::to_string(&resolved).unwrap_or_default();
        let decoded = serde_json::from_str::<EffectivePermissions>(encoded.as_str());

        assert!(matches!(decoded, Ok(value) if value == resolved));
    }

    fn arbitrary_grant() -> impl Strategy<Value = RoleGrant> {
        let roles = prop::sample::select(vec![
            ("viewer", 10),
            ("member", 20),
            ("manager", 30),
            ("admin", 40),
            ("owner", 50),
        ]);
        let permission_names = prop::collection::vec(
            prop::sample::select(vec![
                "staff:read",
                "staff:update",
                "staff:*",
                "roles:create",
                "roles:delete",
                "audit:read",
                "teams:*",
            ]),
            0..4,
        );

        (
            roles,
            permission_names,
            any::<bool>(),
            any::<bool>(),
            prop::bool::weighted(0.2),
        )
            .prop_map(
                |((name, priority), permissions, is_primary, can_manage_staff, via_team)| {
                    let mut value = grant(name, priority, &permissions);
                    value.is_primary = is_primary;
                    value.can_manage_staff = can_manage_staff;
                    value.via_team = via_team;
                    value
                },
            )
    }

    fn without_primary(mut value: EffectivePermissions) -> EffectivePermissions {
        for role in &mut value.roles {
            role.is_primary = false;
        }
        value
    }

    proptest! {
        #[test]
        fn resolution_ignores_assignment_order(
            grants in prop::collection::vec(arbitrary_grant(), 0..8),
            seed in any::<u64>(),
        ) {
            let mut shuffled = grants.clone();
            let length = shuffled.len();
            if length > 1 {
                for index in 0..length {
                    let swap_with = (seed as usize).wrapping_add(index * 7) % length;
                    shuffled.swap(index, swap_with);
                }
            }

            prop_assert_eq!(
                without_primary(resolve(&grants)),
                without_primary(resolve(&shuffled))
            );
        }

        #[test]
        fn duplicated_assignments_are_idempotent(
            grants in prop::collection::vec(arbitrary_grant(), 0..8),
        ) {
            let mut doubled = grants.clone();
            doubled.extend(grants.iter().cloned());

            prop_assert_eq!(resolve(&grants), resolve(&doubled));
        }

        #[test]
        fn additional_role_never_lowers_max_priority(
            grants in prop::collection::vec(arbitrary_grant(), 0..8),
            extra in arbitrary_grant(),
        ) {
            let before = resolve(&grants).max_priority;
            let mut extended = grants.clone();
            extended.push(extra);

            prop_assert!(resolve(&extended).max_priority >= before);
        }
    }
}
