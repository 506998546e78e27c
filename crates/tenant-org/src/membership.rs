//! Membership domain models
//!
//! A membership binds a user to an organization with a role and a status.
//! Rows are never deleted; leaving or being turned away is expressed through
//! the `rejected` and `inactive` statuses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::roles::Role;
use crate::user::UserProfile;

/// Error returned when a string does not name a membership status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown membership status: {0}")]
pub struct UnknownStatus(pub String);

/// Lifecycle status of a membership.
///
/// ```text
/// (none) ──invite──▶ invited ──accept──▶ active | pending
/// pending ──approve──▶ active
/// pending ──reject───▶ rejected
/// active  ◀─────────▶ inactive
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Invitation issued, not yet redeemed
    Invited,

    /// Invitation redeemed, awaiting owner/admin approval
    Pending,

    /// Full member
    Active,

    /// Turned away while pending
    Rejected,

    /// Deactivated member
    Inactive,
}

impl MembershipStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invited => "invited",
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Rejected => "rejected",
            Self::Inactive => "inactive",
        }
    }

    /// Parse status from its string representation (case-insensitive).
    ///
    /// # Examples
    ///
    /// ```
    /// use tenant_org::MembershipStatus;
    ///
    /// assert_eq!(MembershipStatus::parse("Active"), Some(MembershipStatus::Active));
    /// assert_eq!(MembershipStatus::parse("banned"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "invited" => Some(Self::Invited),
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "rejected" => Some(Self::Rejected),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// Whether this status grants access to the organization.
    pub fn grants_access(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::str::FromStr for MembershipStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Organization membership linking a user to an organization.
///
/// At most one row exists per (user, organization) pair.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use tenant_org::{Membership, MembershipStatus, Role};
///
/// let owner = Membership::new(Uuid::now_v7(), Uuid::now_v7(), Role::Owner, MembershipStatus::Active);
/// assert!(owner.is_active());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Unique membership ID
    pub id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Organization ID
    pub organization_id: Uuid,

    /// Role within the organization
    pub role: Role,

    /// Lifecycle status
    pub status: MembershipStatus,

    /// Who invited this user (if applicable)
    pub invited_by: Option<Uuid>,

    /// When the row was created
    pub created_at: DateTime<Utc>,

    /// When the row last changed
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    /// Creates a new membership row.
    pub fn new(user_id: Uuid, organization_id: Uuid, role: Role, status: MembershipStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            organization_id,
            role,
            status,
            invited_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set who invited this user.
    pub fn with_inviter(mut self, inviter_id: Uuid) -> Self {
        self.invited_by = Some(inviter_id);
        self
    }

    /// Whether the membership is active.
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }

    /// Move to `status`, stamping `updated_at`.
    pub fn set_status(&mut self, status: MembershipStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Move to `role`, stamping `updated_at`.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.updated_at = Utc::now();
    }
}

/// A membership together with the member's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMember {
    /// The membership row
    pub membership: Membership,
    /// The member's profile
    pub user: UserProfile,
}
