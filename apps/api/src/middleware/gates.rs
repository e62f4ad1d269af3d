use super::*;

use axum::routing::MethodRouter;
use staffguard_domain::Capability;

/// Declarative requirement attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGate {
    /// Caller must hold the permission.
    Permission(&'static str),
    /// Caller must hold at least one of the permissions.
    AnyPermission(&'static [&'static str]),
    /// Caller's highest role priority must reach the threshold.
    MinPriority(i32),
    /// Caller must hold the capability flag.
    Capability(Capability),
    /// Caller must be enrolled in and have passed a second-factor check.
    StepUp,
}

/// Middleware state carrying the gates of one route.
#[derive(Clone)]
pub struct GateState {
    app: AppState,
    gates: &'static [RouteGate],
}

impl GateState {
    pub fn new(app: AppState, gates: &'static [RouteGate]) -> Self {
        Self { app, gates }
    }

    /// Wraps a method router so every gate runs before its handler.
    pub fn guard(self, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
        route.route_layer(axum::middleware::from_fn_with_state(self, enforce_gates))
    }
}

/// Evaluates route gates against the request context.
///
/// Step-up runs first so an unverified session is told to verify before anything else.
pub async fn enforce_gates(
    State(gate_state): State<GateState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let context = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
    let authorization = &gate_state.app.authorization_service;

    if gate_state.gates.contains(&RouteGate::StepUp) {
        authorization.require_step_up(&context.subject, &context.identity)?;
    }

    for gate in gate_state.gates {
        match *gate {
            RouteGate::Permission(permission) => {
                authorization
                    .require_permission(&context.actor, permission)
                    .await?;
            }
            RouteGate::AnyPermission(permissions) => {
                authorization
                    .require_any_permission(&context.actor, permissions)
                    .await?;
            }
            RouteGate::MinPriority(minimum) => {
                authorization
                    .require_min_priority(&context.actor, minimum)
                    .await?;
            }
            RouteGate::Capability(capability) => {
                authorization
                    .require_capability(&context.actor, capability)
                    .await?;
            }
            RouteGate::StepUp => {}
        }
    }

    Ok(next.run(request).await)
}
