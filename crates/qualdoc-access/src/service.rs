//! Access decision service.
//!
//! Answers "may user U perform action A?", projects effective
//! permission sets for UI consumers, and manages role assignment.
//! Every access check — grant or denial — is recorded in the audit
//! sink; denials are a normal, expected outcome, not an exceptional
//! code path.

use qualdoc_core::access::AccessDecision;
use qualdoc_core::audit::AuditSink;
use qualdoc_core::error::{QualdocError, QualdocResult};
use qualdoc_core::models::audit::{AuditEventKind, AuditOutcome, CreateAuditEvent};
use qualdoc_core::models::permission::{EffectivePermissions, codes};
use qualdoc_core::repository::{GroupRepository, RoleRepository, UserRepository};
use tracing::debug;
use uuid::Uuid;

use crate::resolver::PermissionResolver;

/// Access decision service.
///
/// Generic over repository implementations so that the access layer
/// has no dependency on the database crate.
pub struct AccessService<U, G, R, A>
where
    U: UserRepository + Clone,
    G: GroupRepository,
    R: RoleRepository,
    A: AuditSink,
{
    resolver: PermissionResolver<U, G>,
    user_repo: U,
    role_repo: R,
    audit: A,
}

impl<U, G, R, A> AccessService<U, G, R, A>
where
    U: UserRepository + Clone,
    G: GroupRepository,
    R: RoleRepository,
    A: AuditSink,
{
    pub fn new(user_repo: U, group_repo: G, role_repo: R, audit: A) -> Self {
        Self {
            resolver: PermissionResolver::new(user_repo.clone(), group_repo),
            user_repo,
            role_repo,
            audit,
        }
    }

    /// May `user_id` exercise `permission`?
    ///
    /// Unknown and inactive users are denied. One `access_check`
    /// audit event is recorded unconditionally.
    pub async fn check_access(&self, user_id: Uuid, permission: &str) -> QualdocResult<bool> {
        let resolved = self.resolver.resolve(user_id).await?;

        let granted = match &resolved {
            Some(permissions) => permissions.contains(permission),
            None => false,
        };

        self.audit
            .record(CreateAuditEvent {
                kind: AuditEventKind::AccessCheck,
                user_id,
                subject: permission.to_string(),
                outcome: if granted {
                    AuditOutcome::Success
                } else {
                    AuditOutcome::Denied
                },
                actor_id: user_id,
                metadata: None,
            })
            .await?;

        debug!(%user_id, permission, granted, "access check");

        Ok(granted)
    }

    /// Read-only projection of a user's effective permission set.
    ///
    /// A hard-deleted user fails the identity lookup (`NotFound`); a
    /// soft-deleted user resolves to the empty set while the row stays
    /// enumerable in admin listings.
    pub async fn user_permissions(&self, user_id: Uuid) -> QualdocResult<EffectivePermissions> {
        let user = self.user_repo.get_by_id(user_id).await?;

        if !user.is_active {
            return Ok(EffectivePermissions::none());
        }

        Ok(self
            .resolver
            .resolve(user_id)
            .await?
            .unwrap_or_else(EffectivePermissions::none))
    }

    /// Grant a role's permission codes to a user.
    ///
    /// `assigned_by` must itself hold `manage_users` — checked through
    /// the same audited `check_access` path. Assigning a role the user
    /// already holds is an idempotent re-assertion.
    pub async fn assign_role(
        &self,
        user_id: Uuid,
        role_name: &str,
        assigned_by: Uuid,
    ) -> QualdocResult<()> {
        // 1. The assigner must pass an access check first.
        if !self.check_access(assigned_by, codes::MANAGE_USERS).await? {
            return Err(QualdocError::Forbidden {
                reason: format!("assigning roles requires {}", codes::MANAGE_USERS),
            });
        }

        // 2. Role and target user must exist.
        let role = self.role_repo.get_by_name(role_name).await?;
        let user = self.user_repo.get_by_id(user_id).await?;

        // 3. Union the role's codes into the user's individual set.
        let grant: Vec<String> = role.permissions.iter().cloned().collect();
        self.user_repo.grant_permissions(user.id, &grant).await?;

        // 4. Audit.
        self.audit
            .record(CreateAuditEvent {
                kind: AuditEventKind::RoleAssignment,
                user_id,
                subject: role_name.to_string(),
                outcome: AuditOutcome::Success,
                actor_id: assigned_by,
                metadata: None,
            })
            .await?;

        debug!(%user_id, role_name, %assigned_by, "role assigned");

        Ok(())
    }

    /// Revoke a role's permission codes from a user.
    ///
    /// Symmetric to [`assign_role`](Self::assign_role). Revoking a
    /// role that was never assigned is not an error — the subtraction
    /// is a no-op and the revocation is still audited.
    pub async fn revoke_role(
        &self,
        user_id: Uuid,
        role_name: &str,
        revoked_by: Uuid,
    ) -> QualdocResult<()> {
        // 1. The revoker must pass an access check first.
        if !self.check_access(revoked_by, codes::MANAGE_USERS).await? {
            return Err(QualdocError::Forbidden {
                reason: format!("revoking roles requires {}", codes::MANAGE_USERS),
            });
        }

        // 2. Role and target user must exist.
        let role = self.role_repo.get_by_name(role_name).await?;
        let user = self.user_repo.get_by_id(user_id).await?;

        // 3. Subtract the role's codes from the user's individual set.
        let revoke: Vec<String> = role.permissions.iter().cloned().collect();
        self.user_repo.revoke_permissions(user.id, &revoke).await?;

        // 4. Audit.
        self.audit
            .record(CreateAuditEvent {
                kind: AuditEventKind::RoleRevoked,
                user_id,
                subject: role_name.to_string(),
                outcome: AuditOutcome::Success,
                actor_id: revoked_by,
                metadata: None,
            })
            .await?;

        debug!(%user_id, role_name, %revoked_by, "role revoked");

        Ok(())
    }
}

impl<U, G, R, A> AccessDecision for AccessService<U, G, R, A>
where
    U: UserRepository + Clone,
    G: GroupRepository,
    R: RoleRepository,
    A: AuditSink,
{
    async fn check_access(&self, user_id: Uuid, permission: &str) -> QualdocResult<bool> {
        AccessService::check_access(self, user_id, permission).await
    }

    async fn user_permissions(&self, user_id: Uuid) -> QualdocResult<EffectivePermissions> {
        AccessService::user_permissions(self, user_id).await
    }
}
