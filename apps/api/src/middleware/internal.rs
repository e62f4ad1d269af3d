use super::*;

pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";

/// Guards service-to-service routes with the shared internal secret.
pub async fn require_internal_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let Some(expected) = state.internal_service_secret.as_deref() else {
        return Err(AppError::Unauthorized("internal endpoints are not enabled".to_owned()).into());
    };

    let provided = header_value(request.headers(), INTERNAL_SECRET_HEADER)?.unwrap_or_default();
    if !secrets_match(provided.as_bytes(), expected.as_bytes()) {
        return Err(AppError::Unauthorized("invalid internal service credentials".to_owned()).into());
    }

    Ok(next.run(request).await)
}

fn secrets_match(provided: &[u8], expected: &[u8]) -> bool {
    provided.len() == expected.len()
        && provided
            .iter()
            .zip(expected)
            .fold(0_u8, |difference, (left, right)| difference | (left ^ right))
            == 0
}
