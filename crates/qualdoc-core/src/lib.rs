//! QUALDOC Core — domain models, error taxonomy, repository traits,
//! and the audit/access seams shared across all crates.

pub mod access;
pub mod audit;
pub mod error;
pub mod models;
pub mod repository;

pub use access::AccessDecision;
pub use audit::{AuditFilter, AuditSink, MemoryAuditSink};
pub use error::{QualdocError, QualdocResult};
