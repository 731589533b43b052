//! QUALDOC Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Repository implementations for the `qualdoc-core` traits
//! - Permission-list normalization at the adapter edge
//! - Error types ([`DbError`])

mod connection;
mod error;
pub mod normalize;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
