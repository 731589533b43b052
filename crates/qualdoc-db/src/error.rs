//! Database-specific error types and conversions.

use qualdoc_core::error::QualdocError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate record: {entity} with {key}")]
    Duplicate { entity: String, key: String },

    #[error("Stale status: document {id} no longer in {expected}")]
    Stale { id: String, expected: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<DbError> for QualdocError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => QualdocError::NotFound { entity, id },
            DbError::Duplicate { entity, key } => QualdocError::Conflict {
                message: format!("{entity} with {key} already exists"),
            },
            DbError::Stale { id, expected } => QualdocError::Conflict {
                message: format!("document {id} left status {expected} concurrently"),
            },
            DbError::Validation(message) => QualdocError::Validation { message },
            other => QualdocError::Database(other.to_string()),
        }
    }
}
