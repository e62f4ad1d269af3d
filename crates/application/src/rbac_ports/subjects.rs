use staffguard_core::{SubjectId, TenantId, VendorId};

/// Staff subject projection used by authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRecord {
    /// Internal subject identifier.
    pub subject_id: SubjectId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Vendor the subject belongs to, if any.
    pub vendor_id: Option<VendorId>,
    /// Identity-provider subject identifier.
    pub provider_subject: Option<String>,
    /// Contact email.
    pub email: String,
    /// Disabled subjects never resolve.
    pub is_active: bool,
    /// Subject has enrolled a second factor.
    pub two_factor_enabled: bool,
}
