//! Organization roles
//!
//! This module defines the well-known role levels a user can hold inside an
//! organization. Roles are persisted and transported by their ordinal id
//! (1 = Owner ... 9 = Guest), so the enum converts to and from `i32` and
//! serializes as that integer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when an ordinal does not name a known role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unknown role id: {0}")]
pub struct UnknownRole(pub i32);

/// User role within an organization.
///
/// Only the owner tier (Owner and Admin) can auto-approve invitations and
/// take part in role swaps. The remaining roles describe the kind of member
/// and carry their permissions through the route catalog.
///
/// # Examples
///
/// ```
/// use tenant_org::Role;
///
/// let role = Role::try_from(2).unwrap();
/// assert_eq!(role, Role::Admin);
/// assert!(role.is_owner_tier());
///
/// assert!(!Role::Coach.is_owner_tier());
/// assert_eq!(Role::ClientCurrent.id(), 6);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "i32", into = "i32")]
#[repr(i32)]
pub enum Role {
    /// Full organization control
    Owner = 1,

    /// Manages members and organization content
    Admin = 2,

    /// Coaches clients of the organization
    Coach = 3,

    /// Subject-matter expert (mentor tier)
    Sme = 4,

    /// Former client
    ClientAlumni = 5,

    /// Current client
    ClientCurrent = 6,

    /// Prospective client
    ClientFuture = 7,

    /// External partner
    Partner = 8,

    /// Guest access
    Guest = 9,
}

impl Role {
    /// All roles in ordinal order.
    pub const ALL: [Role; 9] = [
        Role::Owner,
        Role::Admin,
        Role::Coach,
        Role::Sme,
        Role::ClientAlumni,
        Role::ClientCurrent,
        Role::ClientFuture,
        Role::Partner,
        Role::Guest,
    ];

    /// The persisted ordinal id of this role.
    pub fn id(self) -> i32 {
        self as i32
    }

    /// Look up a role by its ordinal id.
    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.id() == id)
    }

    /// Check if this role belongs to the owner tier.
    ///
    /// # Returns
    ///
    /// `true` for Owner and Admin
    pub fn is_owner_tier(self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }

    /// Check if this role counts against the mentor seat limit.
    pub fn is_mentor_tier(self) -> bool {
        matches!(self, Role::Sme)
    }

    /// Check if this role is one of the client roles.
    ///
    /// Client invitations hand the token back to the onboarding flow after
    /// acceptance.
    pub fn is_client(self) -> bool {
        matches!(
            self,
            Role::ClientAlumni | Role::ClientCurrent | Role::ClientFuture
        )
    }

    /// Get a human-readable display name for the role.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenant_org::Role;
    ///
    /// assert_eq!(Role::Sme.display_name(), "SME");
    /// assert_eq!(Role::ClientAlumni.display_name(), "Client Alumni");
    /// ```
    pub fn display_name(self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Admin => "Admin",
            Role::Coach => "Coach",
            Role::Sme => "SME",
            Role::ClientAlumni => "Client Alumni",
            Role::ClientCurrent => "Client Current",
            Role::ClientFuture => "Client Future",
            Role::Partner => "Partner",
            Role::Guest => "Guest",
        }
    }
}

impl TryFrom<i32> for Role {
    type Error = UnknownRole;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        Role::from_id(id).ok_or(UnknownRole(id))
    }
}

impl From<Role> for i32 {
    fn from(role: Role) -> Self {
        role.id()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ids_round_trip() {
        for (index, role) in Role::ALL.iter().enumerate() {
            assert_eq!(role.id(), index as i32 + 1);
            assert_eq!(Role::from_id(role.id()), Some(*role));
        }
    }

    #[test]
    fn test_unknown_role_ids() {
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(10), None);
        assert_eq!(Role::try_from(-1), Err(UnknownRole(-1)));
    }

    #[test]
    fn test_owner_tier() {
        assert!(Role::Owner.is_owner_tier());
        assert!(Role::Admin.is_owner_tier());
        for role in &Role::ALL[2..] {
            assert!(!role.is_owner_tier(), "{role} must not be owner tier");
        }
    }

    #[test]
    fn test_client_roles() {
        assert!(Role::ClientAlumni.is_client());
        assert!(Role::ClientFuture.is_client());
        assert!(!Role::Partner.is_client());
        assert!(!Role::Owner.is_client());
    }

    #[test]
    fn test_role_serializes_as_id() {
        assert_eq!(serde_json::to_string(&Role::Coach).unwrap(), "3");
        let parsed: Role = serde_json::from_str("8").unwrap();
        assert_eq!(parsed, Role::Partner);
        assert!(serde_json::from_str::<Role>("42").is_err());
    }
}
