use super::*;

use axum::http::header::USER_AGENT;
use staffguard_application::ClientMetadata;
use staffguard_core::{TenantId, VendorId};

pub const TENANT_HEADER: &str = "x-jwt-claim-tenant-id";
pub const VENDOR_HEADER: &str = "x-jwt-claim-vendor-id";
pub const USER_HEADER: &str = "x-user-id";
pub const ROLES_HEADER: &str = "x-jwt-claim-roles";
pub const PLATFORM_OWNER_HEADER: &str = "x-jwt-claim-platform_owner";
pub const STEP_UP_HEADER: &str = "x-jwt-claim-mfa-verified";

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
const REAL_IP_HEADER: &str = "x-real-ip";

/// Builds the asserted identity from headers injected by the edge gateway.
///
/// A missing tenant or user is unauthenticated; malformed identifiers are validation
/// errors.
pub fn parse_asserted_identity(headers: &HeaderMap) -> AppResult<AssertedIdentity> {
    let tenant_id = header_value(headers, TENANT_HEADER)?
        .ok_or_else(|| AppError::Unauthorized("missing tenant context".to_owned()))
        .and_then(TenantId::parse)?;
    let external_subject = header_value(headers, USER_HEADER)?
        .ok_or_else(|| AppError::Unauthorized("missing user context".to_owned()))?;
    let vendor_id = header_value(headers, VENDOR_HEADER)?
        .map(VendorId::parse)
        .transpose()?;

    let provider_roles = header_value(headers, ROLES_HEADER)?
        .map(parse_role_claims)
        .transpose()?
        .unwrap_or_default();
    let is_platform_owner = parse_flag(header_value(headers, PLATFORM_OWNER_HEADER)?);
    let step_up_verified = parse_flag(header_value(headers, STEP_UP_HEADER)?);

    Ok(
        AssertedIdentity::new(tenant_id, vendor_id, external_subject)
            .with_provider_roles(provider_roles, is_platform_owner)
            .with_step_up_verified(step_up_verified),
    )
}

/// Extracts the client address and user agent recorded with audit events.
pub fn client_metadata(headers: &HeaderMap) -> ClientMetadata {
    let forwarded_for = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let ip_address = forwarded_for
        .or_else(|| {
            headers
                .get(REAL_IP_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        })
        .map(str::to_owned);

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    ClientMetadata {
        ip_address,
        user_agent,
    }
}

/// Accepts a JSON array of names or a comma-separated list.
fn parse_role_claims(value: &str) -> AppResult<Vec<String>> {
    if value.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(value).map_err(|error| {
            AppError::Validation(format!("header '{ROLES_HEADER}' is not a JSON array: {error}"))
        });
    }

    Ok(value
        .split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(str::to_owned)
        .collect())
}

fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|value| value.eq_ignore_ascii_case("true") || value == "1")
}
