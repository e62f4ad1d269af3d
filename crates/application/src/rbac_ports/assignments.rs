use chrono::{DateTime, Utc};
use staffguard_core::{SubjectId, VendorId};
use uuid::Uuid;

/// Assignment projection mapping a subject to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Assignment identifier.
    pub assignment_id: Uuid,
    /// Assignee.
    pub subject_id: SubjectId,
    /// Assigned role.
    pub role_id: Uuid,
    /// Role name.
    pub role_name: String,
    /// Role priority.
    pub role_priority: i32,
    /// Vendor scope; `None` for tenant-wide assignments.
    pub vendor_id: Option<VendorId>,
    /// Primary assignment flag.
    pub is_primary: bool,
    /// Active flag.
    pub is_active: bool,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Subject who made the assignment, if known.
    pub assigned_by: Option<SubjectId>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
}

/// Input payload for assigning a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRoleInput {
    /// Assignee.
    pub subject_id: SubjectId,
    /// Role to assign.
    pub role_id: Uuid,
    /// Vendor scope; `None` for tenant-wide assignments.
    pub vendor_id: Option<VendorId>,
    /// Marks the assignment primary, clearing other primaries in scope.
    pub is_primary: bool,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Subject making the assignment.
    pub assigned_by: Option<SubjectId>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Input payload for removing a role assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveRoleAssignmentInput {
    /// Assignee.
    pub subject_id: SubjectId,
    /// Assigned role.
    pub role_id: Uuid,
    /// Vendor scope; `None` for tenant-wide assignments.
    pub vendor_id: Option<VendorId>,
    /// Refuse to remove the subject's last active assignment in scope.
    pub protect_last_role: bool,
}
