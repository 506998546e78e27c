//! User accounts
//!
//! A user row is created exactly once per email address. Invitations create
//! a pre-registration row (no username, generated credential) that the
//! invitee completes when they accept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account.
///
/// The password hash is opaque to this crate and never serialized.
///
/// # Examples
///
/// ```
/// use tenant_org::User;
///
/// let user = User::pre_registered("bob@x.com", "$argon2id$...", false);
/// assert!(!user.is_registered());
/// assert!(!user.verified_email);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Unique, normalized email address
    pub email: String,

    /// Unique username, absent until registration completes
    pub username: Option<String>,

    /// Hashed password credential
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Phone number
    pub phone: Option<String>,

    /// Avatar image storage key
    pub avatar_img_key: Option<String>,

    /// Whether the account may act
    pub active: bool,

    /// Whether the email address has been verified
    pub verified_email: bool,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// When the user was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a pre-registration user for an invited email address.
    pub fn pre_registered(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        active: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            email: email.into(),
            username: None,
            password_hash: password_hash.into(),
            first_name: String::new(),
            last_name: String::new(),
            phone: None,
            avatar_img_key: None,
            active,
            verified_email: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a fully registered, active and verified user.
    pub fn registered(
        email: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let mut user = Self::pre_registered(email, password_hash, true);
        user.username = Some(username.into());
        user.first_name = first_name.into();
        user.last_name = last_name.into();
        user.verified_email = true;
        user
    }

    /// Whether registration has been completed (a username is set).
    pub fn is_registered(&self) -> bool {
        self.username.is_some()
    }

    /// First and last name joined by a space, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Public projection of this user.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            avatar_img_key: self.avatar_img_key.clone(),
            active: self.active,
        }
    }
}

/// Normalize an email address for lookup and storage.
///
/// # Examples
///
/// ```
/// use tenant_org::user::normalize_email;
///
/// assert_eq!(normalize_email("  Bob@X.com "), "bob@x.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// The user fields other members of an organization may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID
    pub id: Uuid,
    /// Email address
    pub email: String,
    /// Username, if registered
    pub username: Option<String>,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Phone number
    pub phone: Option<String>,
    /// Avatar image storage key
    pub avatar_img_key: Option<String>,
    /// Whether the account is active
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_registered_user() {
        let user = User::pre_registered("bob@x.com", "hash", true);
        assert!(!user.is_registered());
        assert!(user.active);
        assert!(!user.verified_email);
        assert_eq!(user.full_name(), "");
    }

    #[test]
    fn test_registered_user() {
        let user = User::registered("ann@x.com", "ann", "hash", "Ann", "Lee");
        assert!(user.is_registered());
        assert!(user.active);
        assert!(user.verified_email);
        assert_eq!(user.full_name(), "Ann Lee");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::registered("ann@x.com", "ann", "secret-hash", "Ann", "Lee");
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }

    #[test]
    fn test_profile_projection() {
        let user = User::registered("ann@x.com", "ann", "hash", "Ann", "Lee");
        let profile = user.profile();
        assert_eq!(profile.id, user.id);
        assert_eq!(profile.username.as_deref(), Some("ann"));
    }
}
