//! Permission resolution.
//!
//! Computes the effective permission set for a user at a point in
//! time. Every call re-reads committed state — there is no cache, so
//! membership and permission mutations take effect on the next
//! resolution.

use qualdoc_core::error::{QualdocError, QualdocResult};
use qualdoc_core::models::permission::EffectivePermissions;
use qualdoc_core::repository::{GroupRepository, UserRepository};
use uuid::Uuid;

/// Resolves a user's effective permissions from the credential store.
///
/// Generic over repository implementations so the access layer has no
/// dependency on the database crate.
pub struct PermissionResolver<U: UserRepository, G: GroupRepository> {
    user_repo: U,
    group_repo: G,
}

impl<U: UserRepository, G: GroupRepository> PermissionResolver<U, G> {
    pub fn new(user_repo: U, group_repo: G) -> Self {
        Self {
            user_repo,
            group_repo,
        }
    }

    /// Resolve the effective permission set for `user_id`.
    ///
    /// Returns `Ok(None)` when the user does not exist or is inactive
    /// — callers treat both identically to "no permissions". The
    /// hard-deleted/soft-deleted distinction is made elsewhere, by
    /// identity lookups.
    ///
    /// Superusers short-circuit to the wildcard before any union is
    /// computed. Otherwise the result is the union of the user's
    /// individual permissions and the group permissions of every
    /// active group the user belongs to.
    pub async fn resolve(&self, user_id: Uuid) -> QualdocResult<Option<EffectivePermissions>> {
        let user = match self.user_repo.get_by_id(user_id).await {
            Ok(user) => user,
            Err(QualdocError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        if !user.is_active {
            return Ok(None);
        }

        if user.is_superuser {
            return Ok(Some(EffectivePermissions::All));
        }

        let mut codes = user.individual_permissions;
        for group in self.group_repo.groups_for_user(user_id).await? {
            // Inactive groups contribute nothing.
            if group.is_active {
                codes.extend(group.group_permissions);
            }
        }

        Ok(Some(EffectivePermissions::Set(codes)))
    }
}
