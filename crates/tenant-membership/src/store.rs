//! Membership store abstraction
//!
//! Every lifecycle transition runs inside one [`StoreTransaction`]: the
//! precondition re-checks and the writes they guard either commit together
//! or not at all. Dropping a transaction without calling
//! [`StoreTransaction::commit`] rolls it back.

use async_trait::async_trait;
use tenant_org::{Membership, MembershipStatus, Organization, Role, User};
use thiserror::Error;
use uuid::Uuid;

/// Store error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// An update targeted a row that does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The backend failed
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Filter for membership counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MembershipFilter {
    /// Only rows holding this role
    pub role: Option<Role>,
    /// Only rows in this status
    pub status: Option<MembershipStatus>,
}

impl MembershipFilter {
    /// Every row in the organization.
    pub fn any() -> Self {
        Self::default()
    }

    /// Rows holding `role`, any status.
    pub fn with_role(role: Role) -> Self {
        Self {
            role: Some(role),
            status: None,
        }
    }

    /// Restrict to `status`.
    pub fn and_status(mut self, status: MembershipStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether `membership` passes the filter.
    pub fn matches(&self, membership: &Membership) -> bool {
        self.role.map_or(true, |role| membership.role == role)
            && self.status.map_or(true, |status| membership.status == status)
    }
}

/// Entry point to persistent storage.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Open an atomic unit of work.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;
}

/// One atomic unit of work against the store.
///
/// Implementations must isolate the transaction at least as strongly as
/// read-committed with row locks on the rows it reads, and must reject a
/// second row for the same (user, organization) pair with
/// [`StoreError::UniqueViolation`].
#[async_trait]
pub trait StoreTransaction: Send {
    /// Look up an organization by ID.
    async fn find_organization(&mut self, id: Uuid) -> StoreResult<Option<Organization>>;

    /// Look up an organization by slug.
    async fn find_organization_by_slug(&mut self, slug: &str) -> StoreResult<Option<Organization>>;

    /// Look up an organization by exact name.
    async fn find_organization_by_name(&mut self, name: &str) -> StoreResult<Option<Organization>>;

    /// Insert an organization; name and slug are unique.
    async fn insert_organization(&mut self, org: &Organization) -> StoreResult<()>;

    /// Look up a user by ID.
    async fn find_user(&mut self, id: Uuid) -> StoreResult<Option<User>>;

    /// Look up a user by normalized email.
    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>>;

    /// Look up a user by username (case-insensitive).
    async fn find_user_by_username(&mut self, username: &str) -> StoreResult<Option<User>>;

    /// Insert a user; email and username are unique.
    async fn insert_user(&mut self, user: &User) -> StoreResult<()>;

    /// Replace a stored user.
    async fn update_user(&mut self, user: &User) -> StoreResult<()>;

    /// Look up the membership for a (user, organization) pair.
    async fn find_membership(&mut self, user_id: Uuid, org_id: Uuid) -> StoreResult<Option<Membership>>;

    /// Insert a membership; (user, organization) is unique.
    async fn insert_membership(&mut self, membership: &Membership) -> StoreResult<()>;

    /// Replace a stored membership.
    async fn update_membership(&mut self, membership: &Membership) -> StoreResult<()>;

    /// Count an organization's memberships matching `filter`.
    async fn count_memberships(&mut self, org_id: Uuid, filter: MembershipFilter) -> StoreResult<u64>;

    /// All memberships of an organization, oldest first.
    async fn list_org_memberships(&mut self, org_id: Uuid) -> StoreResult<Vec<Membership>>;

    /// All memberships of a user, oldest first.
    async fn list_user_memberships(&mut self, user_id: Uuid) -> StoreResult<Vec<Membership>>;

    /// Make every write in this transaction durable.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
