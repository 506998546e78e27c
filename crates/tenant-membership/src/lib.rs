//! # Tenant Membership
//!
//! This crate provides the authorization gate and membership lifecycle of
//! the tenant access engine.
//!
//! ## Overview
//!
//! The tenant-membership crate handles:
//! - **Access**: Resolving a caller's membership and checking route grants
//! - **Lifecycle**: Founding, inviting, accepting, approving and role swaps
//! - **Directory**: Listing a user's organizations and an organization's members
//! - **Store**: Transactional persistence contract plus an in-memory backend
//! - **Notifications**: Templated messages dispatched after commit
//!
//! ## Request Flow
//!
//! ```text
//! bearer token ──identify──▶ RequestContext(user)
//!              ──attach_org_access──▶ RequestContext(user, membership)
//!              ──require_route──▶ handler ──▶ LifecycleManager ──▶ store tx
//!                                                    └─after commit──▶ Notifier
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tenant_auth::Argon2Hasher;
//! use tenant_membership::{InMemoryStore, LogNotifier, MembershipConfig, TenantAccess};
//! use tenant_org::Role;
//! use tenant_rbac::Route;
//!
//! # async fn run(authorization: &str, org_id: uuid::Uuid) -> Result<(), Box<dyn std::error::Error>> {
//! let config = MembershipConfig::from_env()?;
//! let engine = TenantAccess::new(
//!     &config,
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(LogNotifier),
//!     Arc::new(Argon2Hasher::default()),
//! )?;
//!
//! let mut ctx = engine.evaluator.identify(Some(authorization))?;
//! engine.evaluator.authorize(&mut ctx, org_id, Route::InviteUser).await?;
//!
//! let invitation = engine
//!     .lifecycle
//!     .invite_user(ctx.membership()?, "bob@x.com", Role::Coach)
//!     .await?;
//! # let _ = invitation;
//! # Ok(())
//! # }
//! ```
//!
//! ## Access Rule
//!
//! Only `active` memberships grant access to an organization. Invited,
//! pending, rejected and inactive members are denied at the gate.

pub mod access;
pub mod config;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod notify;
pub mod service;
pub mod store;

// Re-exports
pub use access::{AccessEvaluator, RequestContext};
pub use config::{ConfigError, MembershipConfig};
pub use directory::Directory;
pub use error::{MembershipError, MembershipResult};
pub use lifecycle::{
    AcceptInvitation, AcceptedInvitation, FoundedOrganization, Invitation, LifecycleManager,
    NewOrganization,
};
pub use memory::InMemoryStore;
pub use notify::{
    LogNotifier, MessageTemplates, Notification, NotificationKind, Notifier, NotifyError,
    RecordingNotifier,
};
pub use service::TenantAccess;
pub use store::{MembershipFilter, MembershipStore, StoreError, StoreResult, StoreTransaction};
