//! Access-layer error types.

use qualdoc_core::error::QualdocError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    AccountInactive,

    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AccessError> for QualdocError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::InvalidCredentials | AccessError::AccountInactive => {
                QualdocError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AccessError::TokenExpired | AccessError::TokenInvalid(_) => {
                QualdocError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AccessError::PasswordTooShort(_) => QualdocError::Validation {
                message: err.to_string(),
            },
            AccessError::Crypto(msg) => QualdocError::Internal(msg),
        }
    }
}
