mod assignments;
mod audit;
mod repositories;
mod roles;
mod subjects;

pub use assignments::{AssignRoleInput, RemoveRoleAssignmentInput, RoleAssignment};
pub use audit::{AuditEvent, AuditLogEntry, AuditLogQuery, ClientMetadata};
pub use repositories::{AuditLogRepository, AuditRepository, RbacRepository, SubjectDirectory};
pub use roles::{CreateRoleInput, RoleDefinition, UpdateRoleInput};
pub use subjects::SubjectRecord;
