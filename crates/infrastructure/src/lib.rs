//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod disabled_permission_cache;
mod in_memory_permission_cache;
mod postgres_audit_log_repository;
mod postgres_audit_repository;
mod postgres_rbac_repository;
mod postgres_subject_directory;
mod redis_permission_cache;

pub use disabled_permission_cache::DisabledPermissionCache;
pub use in_memory_permission_cache::InMemoryPermissionCache;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_rbac_repository::PostgresRbacRepository;
pub use postgres_subject_directory::PostgresSubjectDirectory;
pub use redis_permission_cache::RedisPermissionCache;
