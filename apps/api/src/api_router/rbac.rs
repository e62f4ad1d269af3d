use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, patch, post, put};
use staffguard_domain::{Capability, RoleTier, permissions};

use crate::handlers::rbac;
use crate::middleware::{self, GateState, RouteGate};
use crate::state::AppState;

const READ_ROLES: &[RouteGate] = &[RouteGate::Permission(permissions::ROLES_READ)];
const CREATE_ROLES: &[RouteGate] = &[RouteGate::Capability(Capability::CreateRoles)];
const UPDATE_ROLES: &[RouteGate] = &[RouteGate::Permission(permissions::ROLES_UPDATE)];
const DELETE_ROLES: &[RouteGate] = &[RouteGate::Capability(Capability::DeleteRoles)];
const SEED_ROLES: &[RouteGate] = &[RouteGate::MinPriority(RoleTier::Owner.priority())];
const MANAGE_ASSIGNMENTS: &[RouteGate] = &[
    RouteGate::Permission(permissions::ROLES_ASSIGN),
    RouteGate::Capability(Capability::ManageStaff),
];
const MANAGE_TEAMS: &[RouteGate] = &[
    RouteGate::Permission(permissions::TEAMS_UPDATE),
    RouteGate::Capability(Capability::ManageStaff),
];
const READ_AUDIT: &[RouteGate] = &[
    RouteGate::StepUp,
    RouteGate::Permission(permissions::AUDIT_READ),
];

pub(super) fn build_rbac_routes(app_state: AppState) -> Router<AppState> {
    let gate = |gates: &'static [RouteGate]| GateState::new(app_state.clone(), gates);

    Router::new()
        .route(
            "/api/rbac/me/permissions",
            get(rbac::my_permissions_handler),
        )
        .route(
            "/api/rbac/roles",
            gate(READ_ROLES)
                .guard(get(rbac::list_roles_handler))
                .merge(gate(CREATE_ROLES).guard(post(rbac::create_role_handler))),
        )
        .route(
            "/api/rbac/roles/seed",
            gate(SEED_ROLES).guard(post(rbac::seed_default_roles_handler)),
        )
        .route(
            "/api/rbac/roles/{role_id}",
            gate(CREATE_ROLES)
                .guard(patch(rbac::update_role_handler))
                .merge(gate(DELETE_ROLES).guard(delete(rbac::delete_role_handler))),
        )
        .route(
            "/api/rbac/roles/{role_id}/permissions",
            gate(UPDATE_ROLES).guard(put(rbac::set_role_permissions_handler)),
        )
        .route(
            "/api/rbac/staff/{staff_id}/roles",
            gate(READ_ROLES)
                .guard(get(rbac::list_staff_roles_handler))
                .merge(gate(MANAGE_ASSIGNMENTS).guard(post(rbac::assign_role_handler))),
        )
        .route(
            "/api/rbac/staff/{staff_id}/roles/{role_id}",
            gate(MANAGE_ASSIGNMENTS).guard(delete(rbac::remove_role_handler)),
        )
        .route(
            "/api/rbac/staff/{staff_id}/roles/{role_id}/primary",
            gate(MANAGE_ASSIGNMENTS).guard(put(rbac::set_primary_role_handler)),
        )
        .route(
            "/api/rbac/teams/{team_id}/default-role",
            gate(MANAGE_TEAMS).guard(put(rbac::set_team_default_role_handler)),
        )
        .route(
            "/api/rbac/audit-log",
            gate(READ_AUDIT).guard(get(rbac::list_audit_log_handler)),
        )
        .route_layer(from_fn_with_state(app_state.clone(), middleware::require_identity))
}
