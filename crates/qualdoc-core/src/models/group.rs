//! Interest group and group membership domain models.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bounds for [`InterestGroup::name`] length.
pub const MIN_GROUP_NAME_LEN: usize = 2;
pub const MAX_GROUP_NAME_LEN: usize = 100;

/// A group of users. Every active member inherits the group's
/// permission codes on top of their individual permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestGroup {
    pub id: Uuid,
    /// Unique snake_case identifier, e.g. `quality_management`.
    pub code: String,
    /// Unique display name, 2-100 characters.
    pub name: String,
    pub description: String,
    /// Permission codes granted to every active member.
    pub group_permissions: BTreeSet<String>,
    /// `false` marks a soft-deleted group; it stops contributing
    /// permissions but its memberships remain on record.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroup {
    pub code: String,
    pub name: String,
    pub description: String,
    pub group_permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateGroup {
    pub name: Option<String>,
    pub description: Option<String>,
    pub group_permissions: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Membership of a user in an interest group.
///
/// At most one membership per (user, group) pair is active at once;
/// re-adding a member replaces the existing membership attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMembership {
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub role_in_group: String,
    /// May differ from the user's global approval level.
    pub approval_level_in_group: u8,
    pub is_department_head: bool,
    pub created_at: DateTime<Utc>,
}

/// Attributes carried by a new (or re-asserted) membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipInput {
    pub role_in_group: String,
    pub approval_level_in_group: u8,
    pub is_department_head: bool,
}
