//! Permission catalog, roles, and the resolved permission set.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical permission codes. Call sites use these constants instead
/// of re-spelling strings.
pub mod codes {
    /// Create new documents.
    pub const DOCUMENT_UPLOAD: &str = "document_upload";
    /// Send a draft into review.
    pub const SUBMIT_FOR_REVIEW: &str = "submit_for_review";
    /// Review documents (and reject them back to draft).
    pub const DOCUMENT_REVIEW: &str = "document_review";
    /// Approve, retire, and reactivate documents.
    pub const FINAL_APPROVAL: &str = "final_approval";
    /// Manage users and role assignments.
    pub const MANAGE_USERS: &str = "manage_users";
    /// Full administrative access to system settings.
    pub const SYSTEM_ADMINISTRATION: &str = "system_administration";

    /// All canonical codes with their human descriptions, in catalog
    /// seeding order.
    pub const ALL: &[(&str, &str)] = &[
        (DOCUMENT_UPLOAD, "Create new documents"),
        (SUBMIT_FOR_REVIEW, "Send a draft document into review"),
        (DOCUMENT_REVIEW, "Review documents and reject them back to draft"),
        (FINAL_APPROVAL, "Approve, retire, and reactivate documents"),
        (MANAGE_USERS, "Manage users, memberships, and role assignments"),
        (SYSTEM_ADMINISTRATION, "Administer system settings"),
    ];
}

/// A catalog entry mapping a permission code to its description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    /// Unique snake_case code, e.g. `final_approval`.
    pub code: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    pub code: String,
    pub description: String,
}

/// A named bundle of permission codes.
///
/// Assigning a role to a user unions its codes into the user's
/// individual permissions; revoking subtracts them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub permissions: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
}

/// The resolved permission set of a user at a point in time.
///
/// Superusers resolve to [`EffectivePermissions::All`] — a wildcard
/// sentinel, never an enumeration of catalog codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectivePermissions {
    /// Every permission, past and future. Superusers only.
    All,
    /// An explicit set of permission codes.
    Set(BTreeSet<String>),
}

impl EffectivePermissions {
    /// The empty permission set.
    pub fn none() -> Self {
        Self::Set(BTreeSet::new())
    }

    pub fn contains(&self, code: &str) -> bool {
        match self {
            Self::All => true,
            Self::Set(codes) => codes.contains(code),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::All => false,
            Self::Set(codes) => codes.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_contains_everything() {
        let all = EffectivePermissions::All;
        assert!(all.contains(codes::FINAL_APPROVAL));
        assert!(all.contains("some_future_permission"));
        assert!(!all.is_empty());
    }

    #[test]
    fn set_contains_only_members() {
        let set = EffectivePermissions::Set(
            [codes::DOCUMENT_REVIEW.to_string()].into_iter().collect(),
        );
        assert!(set.contains(codes::DOCUMENT_REVIEW));
        assert!(!set.contains(codes::FINAL_APPROVAL));
    }

    #[test]
    fn none_is_empty() {
        assert!(EffectivePermissions::none().is_empty());
    }
}
