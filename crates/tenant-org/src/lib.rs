//! # Tenant Organization Model
//!
//! This crate provides the data model of the tenant access engine: the
//! organizations that form tenant boundaries, the users that belong to them,
//! and the memberships that bind the two with a role and a lifecycle status.
//!
//! ## Overview
//!
//! The tenant-org crate handles:
//! - **Organizations**: Tenants with a unique name and derived slug
//! - **Users**: Accounts, pre-registration or fully registered
//! - **Roles**: The nine well-known roles and the owner-tier predicate
//! - **Memberships**: User-organization relationships and their statuses
//! - **Tiers**: Subscription tiers with seat limits
//!
//! ## Architecture
//!
//! ```text
//! User
//!   └─ Membership (role, status) ─→ Organization
//!                                      └─ Tier (seat limits)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tenant_org::{Membership, MembershipStatus, Organization, Role, User};
//!
//! let founder = User::registered("ann@acme.io", "ann", "$argon2id$...", "Ann", "Lee");
//! let org = Organization::new("Acme", "1-10");
//! let owner = Membership::new(founder.id, org.id, Role::Owner, MembershipStatus::Active);
//! ```

pub mod membership;
pub mod organization;
pub mod roles;
pub mod tiers;
pub mod user;

// Re-export main types for convenience
pub use membership::{Membership, MembershipStatus, OrganizationMember, UnknownStatus};
pub use organization::{Organization, OrganizationSummary};
pub use roles::{Role, UnknownRole};
pub use tiers::{Tier, TierLimits};
pub use user::{User, UserProfile};
