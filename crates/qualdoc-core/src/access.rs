//! Access decision seam.
//!
//! The workflow engine gates every transition through this trait; the
//! `qualdoc-access` crate provides the implementation.

use uuid::Uuid;

use crate::error::QualdocResult;
use crate::models::permission::EffectivePermissions;

pub trait AccessDecision: Send + Sync {
    /// May `user_id` exercise `permission`? Every call is audited,
    /// including denials.
    fn check_access(
        &self,
        user_id: Uuid,
        permission: &str,
    ) -> impl Future<Output = QualdocResult<bool>> + Send;

    /// Read-only projection of the user's effective permission set.
    /// `NotFound` for hard-deleted users; the empty set for
    /// soft-deleted ones. Not audited.
    fn user_permissions(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = QualdocResult<EffectivePermissions>> + Send;
}
