//! Error types for authentication operations
//!
//! This module defines the errors raised while signing and verifying tokens
//! and while hashing or checking credentials.

use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// JWT token has expired
    #[error("Token has expired")]
    TokenExpired,

    /// JWT token is invalid (malformed, bad signature, wrong audience, etc.)
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token is missing required claims
    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    /// No usable caller identity
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid credentials
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password hashing or hash parsing failed
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// Expired or tampered tokens and wrong passwords are caller mistakes,
    /// not server faults.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            AuthError::Internal(_) | AuthError::ConfigError(_) | AuthError::Hashing(_)
        )
    }

    /// Check if this error means the presented token cannot be used.
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            AuthError::TokenExpired | AuthError::InvalidToken(_) | AuthError::MissingClaim(_)
        )
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::TokenExpired
            | AuthError::InvalidToken(_)
            | AuthError::MissingClaim(_)
            | AuthError::InvalidCredentials
            | AuthError::Unauthorized(_) => 401,

            AuthError::Hashing(_) | AuthError::ConfigError(_) | AuthError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidToken(_) => "INVALID_TOKEN",
            AuthError::MissingClaim(_) => "MISSING_CLAIM",
            AuthError::Unauthorized(_) => "UNAUTHORIZED",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::Hashing(_) => "HASHING_ERROR",
            AuthError::ConfigError(_) => "CONFIG_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
