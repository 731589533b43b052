//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The engine consumes these
//! traits; the `qualdoc-db` crate implements them against SurrealDB.

use uuid::Uuid;

use crate::error::QualdocResult;
use crate::models::{
    document::{CreateDocument, Document, DocumentStatus, StatusHistoryEntry},
    group::{CreateGroup, GroupMembership, InterestGroup, MembershipInput, UpdateGroup},
    permission::{CreatePermission, CreateRole, Permission, Role},
    session::{CreateSession, Session},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Credential store
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Duplicate email (case-insensitive) is a `Conflict`.
    fn create(&self, input: CreateUser) -> impl Future<Output = QualdocResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = QualdocResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = QualdocResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = QualdocResult<User>> + Send;
    /// Soft-delete: sets `is_active` to false. The row stays
    /// enumerable via [`UserRepository::list`].
    fn delete(&self, id: Uuid) -> impl Future<Output = QualdocResult<()>> + Send;
    /// Removes the row, its membership edges, and its sessions.
    /// Subsequent lookups return `NotFound`.
    fn hard_delete(&self, id: Uuid) -> impl Future<Output = QualdocResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = QualdocResult<PaginatedResult<User>>> + Send;

    /// Union permission codes into the user's individual permissions.
    /// Granting codes already held is a no-op for those codes.
    fn grant_permissions(
        &self,
        id: Uuid,
        codes: &[String],
    ) -> impl Future<Output = QualdocResult<()>> + Send;

    /// Subtract permission codes from the user's individual
    /// permissions. Codes not held are ignored.
    fn revoke_permissions(
        &self,
        id: Uuid,
        codes: &[String],
    ) -> impl Future<Output = QualdocResult<()>> + Send;
}

pub trait GroupRepository: Send + Sync {
    /// Duplicate code or name is a `Conflict`.
    fn create(&self, input: CreateGroup)
    -> impl Future<Output = QualdocResult<InterestGroup>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = QualdocResult<InterestGroup>> + Send;
    fn get_by_code(&self, code: &str)
    -> impl Future<Output = QualdocResult<InterestGroup>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateGroup,
    ) -> impl Future<Output = QualdocResult<InterestGroup>> + Send;
    /// Soft-delete: sets `is_active` to false. Memberships survive but
    /// the group stops contributing permissions.
    fn delete(&self, id: Uuid) -> impl Future<Output = QualdocResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = QualdocResult<PaginatedResult<InterestGroup>>> + Send;

    /// Add a user to a group. An existing (user, group) membership is
    /// re-asserted: its attributes are replaced, not an error.
    fn add_member(
        &self,
        user_id: Uuid,
        group_id: Uuid,
        input: MembershipInput,
    ) -> impl Future<Output = QualdocResult<GroupMembership>> + Send;

    /// Remove a membership. Idempotent.
    fn remove_member(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> impl Future<Output = QualdocResult<()>> + Send;

    fn is_member(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> impl Future<Output = QualdocResult<bool>> + Send;

    fn members(
        &self,
        group_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = QualdocResult<PaginatedResult<User>>> + Send;

    /// All groups the user belongs to, active and inactive.
    fn groups_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = QualdocResult<Vec<InterestGroup>>> + Send;

    fn memberships_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = QualdocResult<Vec<GroupMembership>>> + Send;
}

// ---------------------------------------------------------------------------
// Permission catalog
// ---------------------------------------------------------------------------

pub trait PermissionRepository: Send + Sync {
    /// Duplicate code is a `Conflict`.
    fn create(
        &self,
        input: CreatePermission,
    ) -> impl Future<Output = QualdocResult<Permission>> + Send;
    fn get_by_code(&self, code: &str) -> impl Future<Output = QualdocResult<Permission>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = QualdocResult<PaginatedResult<Permission>>> + Send;
}

pub trait RoleRepository: Send + Sync {
    /// Duplicate name is a `Conflict`.
    fn create(&self, input: CreateRole) -> impl Future<Output = QualdocResult<Role>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = QualdocResult<Role>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = QualdocResult<PaginatedResult<Role>>> + Send;
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

pub trait DocumentRepository: Send + Sync {
    fn create(&self, input: CreateDocument)
    -> impl Future<Output = QualdocResult<Document>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = QualdocResult<Document>> + Send;

    /// Atomically flip the status from `from` to `to` and append one
    /// history entry; both writes commit or neither does.
    ///
    /// The status update is a compare-and-swap: if the stored status no
    /// longer equals `from` the whole transaction rolls back and a
    /// `Conflict` is returned, which the workflow engine maps to
    /// `InvalidTransition`.
    fn transition_status(
        &self,
        id: Uuid,
        from: DocumentStatus,
        to: DocumentStatus,
        changed_by: Uuid,
        comment: &str,
    ) -> impl Future<Output = QualdocResult<Document>> + Send;

    /// Status history in chronological order.
    fn history(
        &self,
        document_id: Uuid,
    ) -> impl Future<Output = QualdocResult<Vec<StatusHistoryEntry>>> + Send;

    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = QualdocResult<PaginatedResult<Document>>> + Send;
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = QualdocResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = QualdocResult<Session>> + Send;
    /// Invalidate a single session.
    fn invalidate(&self, id: Uuid) -> impl Future<Output = QualdocResult<()>> + Send;
    /// Invalidate all sessions for a user (e.g. on password change).
    fn invalidate_user_sessions(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = QualdocResult<()>> + Send;
    /// Remove all expired sessions.
    fn cleanup_expired(&self) -> impl Future<Output = QualdocResult<u64>> + Send;
}
