//! # Tenant Authentication
//!
//! This crate provides the credential layer of the tenant access engine.
//!
//! ## Overview
//!
//! The tenant-auth crate handles:
//! - **Access tokens**: Bearer tokens identifying the caller
//! - **Invitations**: Signed, time-limited invitation tokens
//! - **Passwords**: Argon2id hashing and generated placeholder passwords
//!
//! ## Usage
//!
//! ### Access Tokens
//!
//! ```rust,no_run
//! use tenant_auth::JwtService;
//! use uuid::Uuid;
//!
//! let service = JwtService::with_secret("a-process-wide-secret-of-32-bytes-or-more").unwrap();
//!
//! let user_id = Uuid::now_v7();
//! let token = service.generate_access_token(user_id, "ann@acme.io").unwrap();
//!
//! assert_eq!(service.authenticate(&token).unwrap(), user_id);
//! ```
//!
//! ### Invitations
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tenant_auth::{InvitationClaims, InvitationCodec, JwtService};
//! use tenant_org::{MembershipStatus, Role};
//! use uuid::Uuid;
//!
//! let jwt = Arc::new(JwtService::with_secret("a-process-wide-secret-of-32-bytes-or-more").unwrap());
//! let codec = InvitationCodec::new(jwt);
//!
//! let issued = codec.issue(&InvitationClaims {
//!     email: "new@x.io".to_string(),
//!     org_id: Uuid::now_v7(),
//!     role: Role::Coach,
//!     status: MembershipStatus::Active,
//!     inviter_full_name: "Ann Owner".to_string(),
//! }).unwrap();
//!
//! let claims = codec.verify(&issued.token).unwrap();
//! assert_eq!(claims.role, Role::Coach);
//! ```
//!
//! ## Token Separation
//!
//! Access tokens and invitation tokens share one secret but carry different
//! audiences, so neither verifies as the other.

pub mod claims;
pub mod error;
pub mod invitation;
pub mod jwt;
pub mod password;

// Re-exports
pub use claims::AccessClaims;
pub use error::{AuthError, AuthResult};
pub use invitation::{
    InvitationClaims, InvitationCodec, IssuedInvitation, INVITATION_AUDIENCE, INVITATION_TTL_HOURS,
};
pub use jwt::{JwtAlgorithm, JwtConfig, JwtService, MIN_SECRET_LEN};
pub use password::{
    generate_password, Argon2Hasher, PasswordHasher, GENERATED_PASSWORD_LEN, PASSWORD_ALPHABET,
};
