//! Audit event domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened. The vocabulary is fixed; new kinds are additions,
/// never renames, because stored events are permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEventKind {
    /// One permission check, granted or denied.
    AccessCheck,
    /// A role's permission codes were granted to a user.
    RoleAssignment,
    /// A role's permission codes were revoked from a user.
    RoleRevoked,
}

impl AuditEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessCheck => "access_check",
            Self::RoleAssignment => "role_assignment",
            Self::RoleRevoked => "role_revoked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Failure,
    Denied,
}

/// Append-only audit record. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub kind: AuditEventKind,
    /// The user the event is about.
    pub user_id: Uuid,
    /// Permission code or role name the event concerns.
    pub subject: String,
    pub outcome: AuditOutcome,
    /// Who caused the event. Equals `user_id` for self-initiated
    /// checks; the administrator for role mutations.
    pub actor_id: Uuid,
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditEvent {
    pub kind: AuditEventKind,
    pub user_id: Uuid,
    pub subject: String,
    pub outcome: AuditOutcome,
    pub actor_id: Uuid,
    pub metadata: Option<serde_json::Value>,
}
