use chrono::{DateTime, Utc};
use staffguard_core::{SubjectId, TenantId, VendorId};
use staffguard_domain::AuditAction;
use uuid::Uuid;

/// Client metadata captured with audit events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMetadata {
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

/// Audit event written by authorization and administration flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Tenant scope for the event.
    pub tenant_id: TenantId,
    /// Vendor scope for the event.
    pub vendor_id: Option<VendorId>,
    /// Subject that performed the action, if known.
    pub actor: Option<SubjectId>,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Entity type label.
    pub entity_type: String,
    /// Entity identifier.
    pub entity_id: Option<String>,
    /// Subject affected by the action.
    pub target_subject: Option<SubjectId>,
    /// Optional detail payload.
    pub detail: Option<String>,
    /// Client metadata.
    pub client: ClientMetadata,
}

/// Audit log entry projection for administrative views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    /// Stable event identifier.
    pub event_id: Uuid,
    /// Vendor scope.
    pub vendor_id: Option<VendorId>,
    /// Actor subject.
    pub actor: Option<SubjectId>,
    /// Stable action identifier.
    pub action: String,
    /// Entity type label.
    pub entity_type: String,
    /// Entity identifier.
    pub entity_id: Option<String>,
    /// Affected subject.
    pub target_subject: Option<SubjectId>,
    /// Optional detail payload.
    pub detail: Option<String>,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Event timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query parameters for audit log listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Optional inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Optional exclusive upper bound.
    pub to: Option<DateTime<Utc>>,
    /// Optional action filter.
    pub action: Option<AuditAction>,
    /// Optional actor filter.
    pub actor: Option<SubjectId>,
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            action: None,
            actor: None,
            limit: 50,
            offset: 0,
        }
    }
}
