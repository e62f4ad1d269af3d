use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use staffguard_application::{Actor, SubjectRecord, SubjectScope};
use staffguard_core::{AppError, AppResult, AssertedIdentity, SubjectId};

use crate::error::ApiResult;
use crate::state::AppState;

mod gates;
mod identity;
mod internal;


pub use gates::{GateState, RouteGate, enforce_gates};
pub use identity::{
    PLATFORM_OWNER_HEADER, ROLES_HEADER, STEP_UP_HEADER, TENANT_HEADER, USER_HEADER,
    VENDOR_HEADER, client_metadata, parse_asserted_identity,
};
pub use internal::{INTERNAL_SECRET_HEADER, require_internal_secret};

/// Authenticated request context resolved once per request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub identity: AssertedIdentity,
    pub subject: SubjectRecord,
    pub actor: Actor,
}

/// Resolves the asserted identity to an active staff member and schedules role sync.
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = parse_asserted_identity(request.headers())?;
    let subject = resolve_subject(&state, &identity).await?;

    state
        .role_sync_service
        .schedule_sync(&identity, subject.subject_id);

    let actor = Actor::new(
        SubjectScope::new(identity.tenant_id(), identity.vendor_id(), subject.subject_id),
        client_metadata(request.headers()),
    );
    request.extensions_mut().insert(RequestContext {
        identity,
        subject,
        actor,
    });

    Ok(next.run(request).await)
}

async fn resolve_subject(
    state: &AppState,
    identity: &AssertedIdentity,
) -> AppResult<SubjectRecord> {
    let tenant_id = identity.tenant_id();
    let by_provider = state
        .subject_directory
        .find_by_provider_subject(tenant_id, identity.external_subject())
        .await
        .map_err(directory_failure)?;

    let subject = match by_provider {
        Some(subject) => Some(subject),
        None => match SubjectId::parse(identity.external_subject()) {
            Ok(subject_id) => state
                .subject_directory
                .find_by_id(tenant_id, subject_id)
                .await
                .map_err(directory_failure)?,
            Err(_) => None,
        },
    };

    subject
        .filter(|subject| subject.is_active)
        .ok_or_else(|| AppError::Unauthorized("staff member could not be resolved".to_owned()))
}

fn directory_failure(error: AppError) -> AppError {
    tracing::error!(error = %error, "staff lookup failed during authentication");
    AppError::Forbidden("authorization could not be evaluated".to_owned())
}

pub(crate) fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<Option<&'a str>> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::trim)
                .map_err(|_| AppError::Validation(format!("header '{name}' must be visible ASCII")))
        })
        .transpose()
        .map(|value| value.filter(|value| !value.is_empty()))
}
