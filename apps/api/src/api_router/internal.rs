use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};

use crate::state::AppState;
use crate::{handlers, middleware};

pub(super) fn build_internal_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/internal/rbac/staff/{staff_id}/effective-permissions",
            get(handlers::internal::effective_permissions_handler),
        )
        .route(
            "/internal/rbac/authorize",
            post(handlers::internal::authorize_handler),
        )
        .route(
            "/internal/rbac/tenants/{tenant_id}/roles/seed",
            post(handlers::internal::seed_tenant_roles_handler),
        )
        .route_layer(from_fn_with_state(
            app_state,
            middleware::require_internal_secret,
        ))
}
