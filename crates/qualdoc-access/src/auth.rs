//! Authentication service — login, token refresh, and logout
//! orchestration.

use chrono::{Duration, Utc};
use qualdoc_core::error::{QualdocError, QualdocResult};
use qualdoc_core::models::session::CreateSession;
use qualdoc_core::repository::{SessionRepository, UserRepository};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AccessError;
use crate::password;
use crate::token;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub access_token: String,
    /// Raw opaque refresh token (return to client, not stored).
    pub refresh_token: String,
    /// Session ID (can be used for logout).
    pub session_id: Uuid,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Input for the refresh token rotation flow.
#[derive(Debug)]
pub struct RefreshInput {
    pub raw_refresh_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Successful refresh result (new token pair).
#[derive(Debug)]
pub struct RefreshOutput {
    /// New signed JWT access token.
    pub access_token: String,
    /// New opaque refresh token (replaces the consumed one).
    pub refresh_token: String,
    /// New session ID.
    pub session_id: Uuid,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Authentication service.
///
/// Generic over repository implementations so that the access layer
/// has no dependency on the database crate.
pub struct AuthService<U: UserRepository, S: SessionRepository> {
    user_repo: U,
    session_repo: S,
    config: AuthConfig,
}

impl<U: UserRepository, S: SessionRepository> AuthService<U, S> {
    pub fn new(user_repo: U, session_repo: S, config: AuthConfig) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    /// Enforce the configured minimum password length.
    ///
    /// Used wherever a raw password enters the system (account
    /// creation, bootstrap admin).
    pub fn validate_password_policy(&self, password: &str) -> QualdocResult<()> {
        if password.chars().count() < self.config.min_password_length {
            return Err(AccessError::PasswordTooShort(self.config.min_password_length).into());
        }
        Ok(())
    }

    /// Authenticate a user with email + password and issue tokens.
    pub async fn login(&self, input: LoginInput) -> QualdocResult<LoginOutput> {
        // 1. Look up user by email.
        let user = self
            .user_repo
            .get_by_email(&input.email)
            .await
            .map_err(|e| match e {
                QualdocError::NotFound { .. } => AccessError::InvalidCredentials.into(),
                other => other,
            })?;

        // 2. Verify password.
        let valid = password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;

        if !valid {
            return Err(AccessError::InvalidCredentials.into());
        }

        // 3. Soft-deleted accounts cannot log in.
        if !user.is_active {
            return Err(AccessError::AccountInactive.into());
        }

        // 4. Generate refresh token and create session.
        let raw_refresh = token::generate_refresh_token();
        let token_hash = token::hash_refresh_token(&raw_refresh);
        let expires_at =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let session = self
            .session_repo
            .create(CreateSession {
                user_id: user.id,
                token_hash,
                ip_address: input.ip_address,
                user_agent: input.user_agent,
                expires_at,
            })
            .await?;

        // 5. Issue JWT access token.
        let access_token = token::issue_access_token(user.id, &self.config)?;

        Ok(LoginOutput {
            access_token,
            refresh_token: raw_refresh,
            session_id: session.id,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Rotate a refresh token: consume the old one, verify the user
    /// is still active, and issue a new token pair.
    ///
    /// Each refresh token is single-use — the old session is
    /// invalidated before the new one is created.
    pub async fn refresh(&self, input: RefreshInput) -> QualdocResult<RefreshOutput> {
        // 1. Look up session by token hash.
        let token_hash = token::hash_refresh_token(&input.raw_refresh_token);
        let session = self
            .session_repo
            .get_by_token_hash(&token_hash)
            .await
            .map_err(|e| match e {
                QualdocError::NotFound { .. } => {
                    AccessError::TokenInvalid("refresh token not found or already used".into())
                        .into()
                }
                other => other,
            })?;

        // 2. Check session expiry.
        if session.expires_at <= Utc::now() {
            // Invalidate the expired session and reject.
            let _ = self.session_repo.invalidate(session.id).await;
            return Err(AccessError::TokenExpired.into());
        }

        // 3. Invalidate old session (single-use guarantee).
        self.session_repo.invalidate(session.id).await?;

        // 4. Verify user is still active.
        let user = self.user_repo.get_by_id(session.user_id).await?;
        if !user.is_active {
            return Err(AccessError::AccountInactive.into());
        }

        // 5. Create new session with rotated refresh token.
        let raw_refresh = token::generate_refresh_token();
        let new_hash = token::hash_refresh_token(&raw_refresh);
        let expires_at =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let new_session = self
            .session_repo
            .create(CreateSession {
                user_id: user.id,
                token_hash: new_hash,
                ip_address: input.ip_address,
                user_agent: input.user_agent,
                expires_at,
            })
            .await?;

        // 6. Issue new access token.
        let access_token = token::issue_access_token(user.id, &self.config)?;

        Ok(RefreshOutput {
            access_token,
            refresh_token: raw_refresh,
            session_id: new_session.id,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Invalidate a single session (logout).
    pub async fn logout(&self, session_id: Uuid) -> QualdocResult<()> {
        self.session_repo.invalidate(session_id).await
    }

    /// Revoke all sessions for a user (e.g. on password change or
    /// account deactivation).
    pub async fn revoke_all_sessions(&self, user_id: Uuid) -> QualdocResult<()> {
        self.session_repo.invalidate_user_sessions(user_id).await
    }
}
