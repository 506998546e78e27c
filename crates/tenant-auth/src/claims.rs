//! JWT claims for caller identity
//!
//! Every request to an organization-scoped route carries a bearer token
//! whose subject is the caller's user id. The access evaluator starts from
//! the identity these claims provide.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Standard JWT claims identifying an authenticated user.
///
/// # Example
///
/// ```rust,no_run
/// use tenant_auth::claims::AccessClaims;
/// use uuid::Uuid;
///
/// let claims = AccessClaims::new(
///     Uuid::now_v7(),
///     "ann@acme.io",
///     "tenant-access",
///     vec!["tenant-api".to_string()],
///     chrono::Duration::hours(1),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    // Standard JWT claims (RFC 7519)
    /// Subject (user ID)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: Vec<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// User email
    pub email: String,
}

impl AccessClaims {
    /// Create new access claims for a user.
    pub fn new(
        user_id: Uuid,
        email: impl Into<String>,
        issuer: impl Into<String>,
        audience: Vec<String>,
        duration: chrono::Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            iss: issuer.into(),
            aud: audience,
            exp: (now + duration).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
            email: email.into(),
        }
    }

    /// Get the user ID as UUID.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    /// Check if the token is expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Get expiration as DateTime.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}
