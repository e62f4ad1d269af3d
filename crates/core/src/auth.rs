use serde::{Deserialize, Serialize};

use crate::{TenantId, VendorId};

/// Identity claims forwarded by the edge authentication layer, validated once at the
/// trust boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertedIdentity {
    tenant_id: TenantId,
    vendor_id: Option<VendorId>,
    external_subject: String,
    provider_roles: Vec<String>,
    is_platform_owner: bool,
    step_up_verified: bool,
}

impl AssertedIdentity {
    /// Creates an identity without provider role claims.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        vendor_id: Option<VendorId>,
        external_subject: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            vendor_id,
            external_subject: external_subject.into(),
            provider_roles: Vec::new(),
            is_platform_owner: false,
            step_up_verified: false,
        }
    }

    /// Attaches provider role claims. Blank and duplicate names are dropped.
    #[must_use]
    pub fn with_provider_roles(mut self, roles: Vec<String>, is_platform_owner: bool) -> Self {
        let mut normalized: Vec<String> = Vec::with_capacity(roles.len());
        for role in roles {
            let role = role.trim();
            if !role.is_empty() && !normalized.iter().any(|existing| existing == role) {
                normalized.push(role.to_owned());
            }
        }

        self.provider_roles = normalized;
        self.is_platform_owner = is_platform_owner;
        self
    }

    /// Marks the session as having passed a fresh secondary-factor check.
    #[must_use]
    pub fn with_step_up_verified(mut self, verified: bool) -> Self {
        self.step_up_verified = verified;
        self
    }

    /// Returns the tenant asserted for the request.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the vendor scope, if any.
    #[must_use]
    pub fn vendor_id(&self) -> Option<VendorId> {
        self.vendor_id
    }

    /// Returns the user identifier asserted by the identity provider.
    #[must_use]
    pub fn external_subject(&self) -> &str {
        self.external_subject.as_str()
    }

    /// Returns asserted provider role names.
    #[must_use]
    pub fn provider_roles(&self) -> &[String] {
        self.provider_roles.as_slice()
    }

    /// Returns whether the platform-owner claim is set.
    #[must_use]
    pub fn is_platform_owner(&self) -> bool {
        self.is_platform_owner
    }

    /// Returns whether a secondary factor was verified for this session.
    #[must_use]
    pub fn step_up_verified(&self) -> bool {
        self.step_up_verified
    }

    /// Returns whether any role claims are present that a sync could act on.
    #[must_use]
    pub fn has_role_claims(&self) -> bool {
        self.is_platform_owner || !self.provider_roles.is_empty()
    }
}
