//! Invitation tokens
//!
//! An invitation is a signed, self-contained token: whoever holds it can
//! complete the invitation within its validity window. Nothing about the
//! invitation is stored server-side beyond the membership row it points at.

use crate::error::{AuthError, AuthResult};
use crate::jwt::JwtService;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tenant_org::{MembershipStatus, Role};
use uuid::Uuid;

/// Default lifetime of an invitation token, in hours.
pub const INVITATION_TTL_HOURS: i64 = 24;

/// Audience stamped on invitation tokens, keeping them apart from access tokens.
pub const INVITATION_AUDIENCE: &str = "invitation";

/// Payload of an invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationClaims {
    /// Invitee email, normalized
    pub email: String,

    /// Target organization
    pub org_id: Uuid,

    /// Role the invitee will hold
    #[serde(rename = "roleId")]
    pub role: Role,

    /// Status the membership moves to on acceptance
    pub status: MembershipStatus,

    /// Display name of the inviter
    #[serde(rename = "currentUserFullName")]
    pub inviter_full_name: String,
}

/// Signed form of the claims.
#[derive(Debug, Serialize, Deserialize)]
struct InvitationToken {
    #[serde(flatten)]
    claims: InvitationClaims,
    iss: String,
    aud: String,
    exp: i64,
    iat: i64,
    jti: String,
}

/// A freshly signed invitation.
#[derive(Debug, Clone)]
pub struct IssuedInvitation {
    /// The opaque token handed to the invitee
    pub token: String,

    /// Instant after which the token no longer verifies
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies invitation tokens with the shared JWT secret.
#[derive(Debug, Clone)]
pub struct InvitationCodec {
    jwt: Arc<JwtService>,
    ttl: Duration,
}

impl InvitationCodec {
    /// Codec with the default 24 hour lifetime.
    pub fn new(jwt: Arc<JwtService>) -> Self {
        Self {
            jwt,
            ttl: Duration::hours(INVITATION_TTL_HOURS),
        }
    }

    /// Override the token lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Configured token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign an invitation.
    pub fn issue(&self, claims: &InvitationClaims) -> AuthResult<IssuedInvitation> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let token = InvitationToken {
            claims: claims.clone(),
            iss: self.jwt.config().issuer.clone(),
            aud: INVITATION_AUDIENCE.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
        };

        Ok(IssuedInvitation {
            token: self.jwt.encode(&token)?,
            expires_at,
        })
    }

    /// Verify signature, audience and expiry, then return the payload.
    pub fn verify(&self, token: &str) -> AuthResult<InvitationClaims> {
        let mut validation = self.jwt.validation();
        validation.set_audience(&[INVITATION_AUDIENCE]);
        let decoded: InvitationToken = self.jwt.decode(token, &validation)?;
        if decoded.claims.email.is_empty() {
            return Err(AuthError::MissingClaim("email".to_string()));
        }
        Ok(decoded.claims)
    }
}
