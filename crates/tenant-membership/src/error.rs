//! Error types for access evaluation and membership lifecycle operations

use crate::store::StoreError;
use tenant_auth::AuthError;
use tenant_org::Role;
use thiserror::Error;

/// Errors surfaced to the transport layer.
#[derive(Debug, Error)]
pub enum MembershipError {
    /// No resolvable caller identity
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// No usable membership in the organization
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Membership exists but its role is not granted the route
    #[error("Permission denied: role {role} may not call {method} {path}")]
    PermissionDenied {
        /// Caller's role
        role: Role,
        /// Requested method
        method: String,
        /// Requested path template
        path: String,
    },

    /// Missing or malformed input, or a transition that is not allowed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Duplicate membership, invitation, name or slug
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Subscription tier limit reached
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Referenced organization, user or membership is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invitation token expired or unverifiable
    #[error("Invalid invitation token: {0}")]
    TokenInvalid(String),

    /// Store failure; nothing was committed
    #[error("Store error: {0}")]
    Store(String),

    /// Notification delivery failed after the transition committed
    #[error("Notification failed: {0}")]
    Notification(String),

    /// Programming-contract violation
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for membership operations.
pub type MembershipResult<T> = Result<T, MembershipError>;

impl MembershipError {
    /// Whether the state transition was durably applied despite the error.
    pub fn is_committed(&self) -> bool {
        matches!(self, MembershipError::Notification(_))
    }

    /// Whether this error comes from a collaborator rather than the caller.
    pub fn is_dependency_error(&self) -> bool {
        matches!(self, MembershipError::Store(_) | MembershipError::Notification(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            MembershipError::Unauthenticated(_) | MembershipError::TokenInvalid(_) => 401,
            MembershipError::CapacityExceeded(_) => 402,
            MembershipError::AccessDenied(_) | MembershipError::PermissionDenied { .. } => 403,
            MembershipError::Validation(_) => 400,
            MembershipError::NotFound(_) => 404,
            MembershipError::Conflict(_) => 409,
            MembershipError::Notification(_) => 502,
            MembershipError::Store(_) => 503,
            MembershipError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            MembershipError::Unauthenticated(_) => "UNAUTHENTICATED",
            MembershipError::AccessDenied(_) => "ACCESS_DENIED",
            MembershipError::PermissionDenied { .. } => "PERMISSION_DENIED",
            MembershipError::Validation(_) => "VALIDATION_ERROR",
            MembershipError::Conflict(_) => "CONFLICT",
            MembershipError::CapacityExceeded(_) => "CAPACITY_EXCEEDED",
            MembershipError::NotFound(_) => "NOT_FOUND",
            MembershipError::TokenInvalid(_) => "TOKEN_INVALID",
            MembershipError::Store(_) | MembershipError::Notification(_) => "DEPENDENCY_ERROR",
            MembershipError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StoreError> for MembershipError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(what) => MembershipError::Conflict(what),
            StoreError::NotFound(what) => MembershipError::NotFound(what),
            StoreError::Backend(msg) => MembershipError::Store(msg),
        }
    }
}

impl From<AuthError> for MembershipError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => MembershipError::TokenInvalid("token has expired".to_string()),
            AuthError::InvalidToken(msg) => MembershipError::TokenInvalid(msg),
            AuthError::MissingClaim(claim) => {
                MembershipError::TokenInvalid(format!("missing claim {}", claim))
            }
            AuthError::Unauthorized(msg) => MembershipError::Unauthenticated(msg),
            AuthError::InvalidCredentials => {
                MembershipError::Unauthenticated("invalid credentials".to_string())
            }
            other => MembershipError::Internal(other.to_string()),
        }
    }
}
