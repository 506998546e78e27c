//! Subscription tiers and seat limits
//!
//! This module defines the subscription tiers an organization can be on and
//! the membership capacity each tier grants. The lifecycle manager consults
//! these limits before it creates a first-time user during an invitation.

use serde::{Deserialize, Serialize};

/// Subscription tier for an organization.
///
/// Tiers determine how many members, admins and mentors an organization
/// may hold. New organizations start on `Trial`.
///
/// # Examples
///
/// ```
/// use tenant_org::Tier;
///
/// let limits = Tier::Trial.limits();
/// assert_eq!(limits.members, Some(5));
/// assert_eq!(Tier::Enterprise.limits().members, None);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Trial granted on organization creation
    #[default]
    Trial,

    /// Small practices
    Starter,

    /// Growing teams
    Growth,

    /// Unlimited seats
    Enterprise,
}

impl Tier {
    /// Get the seat limits for this tier.
    ///
    /// `None` means the limit does not apply.
    pub fn limits(&self) -> TierLimits {
        match self {
            Tier::Trial => TierLimits {
                members: Some(5),
                admins: Some(1),
                mentors: Some(1),
            },
            Tier::Starter => TierLimits {
                members: Some(25),
                admins: Some(2),
                mentors: Some(5),
            },
            Tier::Growth => TierLimits {
                members: Some(100),
                admins: Some(5),
                mentors: Some(20),
            },
            Tier::Enterprise => TierLimits::unlimited(),
        }
    }

    /// Get string representation of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Trial => "trial",
            Tier::Starter => "starter",
            Tier::Growth => "growth",
            Tier::Enterprise => "enterprise",
        }
    }

    /// Parse tier from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trial" => Some(Self::Trial),
            "starter" => Some(Self::Starter),
            "growth" => Some(Self::Growth),
            "enterprise" => Some(Self::Enterprise),
            _ => None,
        }
    }
}

/// Seat limits attached to a subscription tier.
///
/// Field names follow the subscription feature keys `MembersLimit`,
/// `AdminRoleLimit` and `MentorRoleLimit`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TierLimits {
    /// Maximum memberships in the organization, any status
    pub members: Option<u32>,

    /// Maximum memberships holding the Admin role
    pub admins: Option<u32>,

    /// Maximum memberships holding a mentor-tier role
    pub mentors: Option<u32>,
}

impl TierLimits {
    /// Limits that never block.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Check whether one more seat fits under `limit` given `current` usage.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenant_org::TierLimits;
    ///
    /// assert!(TierLimits::has_room(Some(3), 2));
    /// assert!(!TierLimits::has_room(Some(3), 3));
    /// assert!(TierLimits::has_room(None, 10_000));
    /// ```
    pub fn has_room(limit: Option<u32>, current: u64) -> bool {
        match limit {
            Some(max) => current < u64::from(max),
            None => true,
        }
    }
}
