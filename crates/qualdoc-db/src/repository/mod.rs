//! SurrealDB repository implementations.

mod audit;
mod catalog;
mod document;
mod group;
mod session;
mod user;

pub use audit::SurrealAuditSink;
pub use catalog::{SurrealPermissionRepository, SurrealRoleRepository};
pub use document::SurrealDocumentRepository;
pub use group::SurrealGroupRepository;
pub use session::SurrealSessionRepository;
pub use user::{SurrealUserRepository, hash_password, verify_password};
