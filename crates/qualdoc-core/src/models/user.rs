//! User domain model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bounds for [`User::approval_level`]; a coarse seniority signal used by
/// workflow UI decisions, distinct from permission-code authorization.
pub const MIN_APPROVAL_LEVEL: u8 = 1;
pub const MAX_APPROVAL_LEVEL: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Unique, stored lowercased so uniqueness is case-insensitive.
    pub email: String,
    pub full_name: String,
    /// Opaque Argon2id PHC string.
    pub password_hash: String,
    /// `false` marks a soft-deleted account; the row stays enumerable.
    pub is_active: bool,
    /// Superusers hold every permission implicitly.
    pub is_superuser: bool,
    /// Permission codes granted directly, outside any group.
    pub individual_permissions: BTreeSet<String>,
    pub approval_level: u8,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub full_name: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub is_superuser: bool,
    pub approval_level: u8,
    pub individual_permissions: Vec<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub approval_level: Option<u8>,
    pub metadata: Option<serde_json::Value>,
}
