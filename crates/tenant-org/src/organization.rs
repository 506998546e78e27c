//! Organization domain models
//!
//! This module provides the Organization entity, the tenant boundary of the
//! system. An organization's name and slug are fixed at creation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::membership::MembershipStatus;
use crate::roles::Role;
use crate::tiers::Tier;

/// An organization represents a tenant in the multi-tenant system.
///
/// Users belong to organizations through memberships. Both `name` and `slug`
/// are unique across the platform; the slug is derived from the name by
/// [`slugify`] when the organization is created.
///
/// # Examples
///
/// ```
/// use tenant_org::{Organization, Tier};
///
/// let org = Organization::new("Acme Corp", "11-50");
/// assert_eq!(org.slug, "acme-corp");
/// assert_eq!(org.tier, Tier::Trial);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier for the organization
    pub id: Uuid,

    /// Human-readable name
    pub name: String,

    /// URL-friendly slug (unique across platform)
    pub slug: String,

    /// Size category chosen at creation (e.g. "1-10")
    pub size: String,

    /// Subscription tier for seat limits
    pub tier: Tier,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Creates a new organization on the trial tier.
    ///
    /// The slug is projected from `name`; callers validate that the
    /// projection is non-empty and unique before persisting.
    pub fn new(name: impl Into<String>, size: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            slug: slugify(&name),
            name,
            size: size.into(),
            tier: Tier::Trial,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the subscription tier.
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }
}

/// Project an organization name onto its URL slug.
///
/// The projection lowercases ASCII letters, keeps ASCII digits, collapses
/// every run of other characters into a single hyphen and trims hyphens from
/// both ends. It is deterministic, so equal names always collide on slug.
///
/// # Examples
///
/// ```
/// use tenant_org::organization::slugify;
///
/// assert_eq!(slugify("Acme Corp"), "acme-corp");
/// assert_eq!(slugify("  R&D -- Labs!! "), "r-d-labs");
/// assert_eq!(slugify("***"), "");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// An organization as seen by one of its members.
///
/// Returned when listing the organizations a user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSummary {
    /// Organization ID
    pub id: Uuid,

    /// Organization name
    pub name: String,

    /// Slug
    pub slug: String,

    /// User's role in this organization
    pub role: Role,

    /// Status of the user's membership
    pub status: MembershipStatus,
}
