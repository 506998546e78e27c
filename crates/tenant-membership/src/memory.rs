//! In-memory membership store
//!
//! Suitable for single-process deployments and testing. A transaction holds
//! the store lock from `begin` until it commits or is dropped, so
//! transactions are fully serialized. Reads go straight to the committed
//! data; the first write takes a private copy, so a dropped transaction
//! leaves no trace and read-only transactions copy nothing.

use crate::store::{MembershipFilter, MembershipStore, StoreError, StoreResult, StoreTransaction};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tenant_org::{Membership, Organization, User};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct State {
    organizations: HashMap<Uuid, Organization>,
    users: HashMap<Uuid, User>,
    memberships: HashMap<Uuid, Membership>,
}

impl State {
    /// Backstop run on commit, mirroring the unique index on
    /// (user_id, organization_id). One row per pair implies at most one
    /// active row per pair.
    fn check_constraints(&self) -> StoreResult<()> {
        let mut pairs = HashSet::new();
        for membership in self.memberships.values() {
            if !pairs.insert((membership.user_id, membership.organization_id)) {
                return Err(StoreError::UniqueViolation(
                    "memberships(user_id, organization_id)".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn sorted<T: Clone, F>(rows: impl Iterator<Item = T>, key: F) -> Vec<T>
    where
        F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
    {
        let mut rows: Vec<T> = rows.collect();
        rows.sort_by_key(|row| key(row));
        rows
    }
}

/// In-memory implementation of [`MembershipStore`].
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore").finish_non_exhaustive()
    }
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail with a backend error.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Committed memberships, oldest first.
    pub async fn memberships(&self) -> Vec<Membership> {
        let state = self.state.lock().await;
        State::sorted(state.memberships.values().cloned(), |m| m.created_at)
    }

    /// Committed users, oldest first.
    pub async fn users(&self) -> Vec<User> {
        let state = self.state.lock().await;
        State::sorted(state.users.values().cloned(), |u| u.created_at)
    }

    /// Committed organizations, oldest first.
    pub async fn organizations(&self) -> Vec<Organization> {
        let state = self.state.lock().await;
        State::sorted(state.organizations.values().cloned(), |o| o.created_at)
    }

    async fn open(&self) -> MemoryTransaction {
        MemoryTransaction {
            guard: self.state.clone().lock_owned().await,
            working: None,
            fail_commit: self.fail_next_commit.clone(),
        }
    }
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(self.open().await))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<State>,
    /// Copy-on-write snapshot, taken on the first write.
    working: Option<State>,
    fail_commit: Arc<AtomicBool>,
}

impl MemoryTransaction {
    fn state(&self) -> &State {
        self.working.as_ref().unwrap_or(&*self.guard)
    }

    fn state_mut(&mut self) -> &mut State {
        let committed = &self.guard;
        self.working.get_or_insert_with(|| State::clone(committed))
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn find_organization(&mut self, id: Uuid) -> StoreResult<Option<Organization>> {
        Ok(self.state().organizations.get(&id).cloned())
    }

    async fn find_organization_by_slug(&mut self, slug: &str) -> StoreResult<Option<Organization>> {
        Ok(self
            .state()
            .organizations
            .values()
            .find(|org| org.slug == slug)
            .cloned())
    }

    async fn find_organization_by_name(&mut self, name: &str) -> StoreResult<Option<Organization>> {
        Ok(self
            .state()
            .organizations
            .values()
            .find(|org| org.name == name)
            .cloned())
    }

    async fn insert_organization(&mut self, org: &Organization) -> StoreResult<()> {
        let taken = self
            .state()
            .organizations
            .values()
            .any(|existing| existing.name == org.name || existing.slug == org.slug);
        if taken || self.state().organizations.contains_key(&org.id) {
            return Err(StoreError::UniqueViolation("organizations(name, slug)".to_string()));
        }
        self.state_mut().organizations.insert(org.id, org.clone());
        Ok(())
    }

    async fn find_user(&mut self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state().users.get(&id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .state()
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .state()
            .users
            .values()
            .find(|user| {
                user.username
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(username))
            })
            .cloned())
    }

    async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
        if self.state().users.contains_key(&user.id) {
            return Err(StoreError::UniqueViolation("users(id)".to_string()));
        }
        if self.state().users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users(email)".to_string()));
        }
        self.state_mut().users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> StoreResult<()> {
        let state = self.state();
        let username_taken = user.username.as_deref().is_some_and(|name| {
            state.users.values().any(|other| {
                other.id != user.id
                    && other
                        .username
                        .as_deref()
                        .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
        });
        if username_taken {
            return Err(StoreError::UniqueViolation("users(username)".to_string()));
        }
        match self.state_mut().users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("user {}", user.id))),
        }
    }

    async fn find_membership(&mut self, user_id: Uuid, org_id: Uuid) -> StoreResult<Option<Membership>> {
        Ok(self
            .state()
            .memberships
            .values()
            .find(|m| m.user_id == user_id && m.organization_id == org_id)
            .cloned())
    }

    async fn insert_membership(&mut self, membership: &Membership) -> StoreResult<()> {
        let duplicate = self.state().memberships.values().any(|m| {
            m.user_id == membership.user_id && m.organization_id == membership.organization_id
        });
        if duplicate || self.state().memberships.contains_key(&membership.id) {
            return Err(StoreError::UniqueViolation(
                "memberships(user_id, organization_id)".to_string(),
            ));
        }
        self.state_mut().memberships.insert(membership.id, membership.clone());
        Ok(())
    }

    async fn update_membership(&mut self, membership: &Membership) -> StoreResult<()> {
        match self.state_mut().memberships.get_mut(&membership.id) {
            Some(stored) => {
                *stored = membership.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("membership {}", membership.id))),
        }
    }

    async fn count_memberships(&mut self, org_id: Uuid, filter: MembershipFilter) -> StoreResult<u64> {
        let count = self
            .state()
            .memberships
            .values()
            .filter(|m| m.organization_id == org_id && filter.matches(m))
            .count();
        Ok(count as u64)
    }

    async fn list_org_memberships(&mut self, org_id: Uuid) -> StoreResult<Vec<Membership>> {
        Ok(State::sorted(
            self.state()
                .memberships
                .values()
                .filter(|m| m.organization_id == org_id)
                .cloned(),
            |m| m.created_at,
        ))
    }

    async fn list_user_memberships(&mut self, user_id: Uuid) -> StoreResult<Vec<Membership>> {
        Ok(State::sorted(
            self.state()
                .memberships
                .values()
                .filter(|m| m.user_id == user_id)
                .cloned(),
            |m| m.created_at,
        ))
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction {
            mut guard,
            working,
            fail_commit,
        } = *self;

        if fail_commit.swap(false, Ordering::SeqCst) {
            warn!("Injected commit failure, rolling back");
            return Err(StoreError::Backend("commit failed".to_string()));
        }

        match working {
            Some(working) => {
                working.check_constraints()?;
                *guard = working;
                debug!("Transaction committed");
            }
            None => debug!("Read-only transaction committed"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenant_org::{MembershipStatus, Role};

    fn org(name: &str) -> Organization {
        Organization::new(name, "1-10")
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_organization(&org("Acme")).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.organizations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let store = InMemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_organization(&org("Acme")).await.unwrap();
        }

        assert!(store.organizations().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_rolls_back() {
        let store = InMemoryStore::new();
        store.fail_next_commit();

        let mut tx = store.begin().await.unwrap();
        tx.insert_organization(&org("Acme")).await.unwrap();
        assert!(matches!(tx.commit().await, Err(StoreError::Backend(_))));
        assert!(store.organizations().await.is_empty());

        // Only the next commit fails
        let mut tx = store.begin().await.unwrap();
        tx.insert_organization(&org("Acme")).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.organizations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unique_organization_name_and_slug() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_organization(&org("Acme Corp")).await.unwrap();

        let same_slug = org("acme   corp");
        assert!(matches!(
            tx.insert_organization(&same_slug).await,
            Err(StoreError::UniqueViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_unique_membership_pair() {
        let store = InMemoryStore::new();
        let (user_id, org_id) = (Uuid::now_v7(), Uuid::now_v7());
        let mut tx = store.begin().await.unwrap();

        tx.insert_membership(&Membership::new(user_id, org_id, Role::Coach, MembershipStatus::Invited))
            .await
            .unwrap();
        let second = Membership::new(user_id, org_id, Role::Guest, MembershipStatus::Active);

        assert!(matches!(
            tx.insert_membership(&second).await,
            Err(StoreError::UniqueViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_username_unique_case_insensitive() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let ann = User::registered("ann@x.io", "Ann", "hash", "Ann", "A");
        let mut bob = User::pre_registered("bob@x.io", "hash", false);
        tx.insert_user(&ann).await.unwrap();
        tx.insert_user(&bob).await.unwrap();

        assert!(tx.find_user_by_username("ANN").await.unwrap().is_some());

        bob.username = Some("ann".to_string());
        assert!(matches!(
            tx.update_user(&bob).await,
            Err(StoreError::UniqueViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_counts_and_listing() {
        let store = InMemoryStore::new();
        let org_id = Uuid::now_v7();
        let mut tx = store.begin().await.unwrap();
        for (role, status) in [
            (Role::Owner, MembershipStatus::Active),
            (Role::Admin, MembershipStatus::Active),
            (Role::Admin, MembershipStatus::Invited),
            (Role::Sme, MembershipStatus::Rejected),
        ] {
            tx.insert_membership(&Membership::new(Uuid::now_v7(), org_id, role, status))
                .await
                .unwrap();
        }

        assert_eq!(tx.count_memberships(org_id, MembershipFilter::any()).await.unwrap(), 4);
        assert_eq!(
            tx.count_memberships(org_id, MembershipFilter::with_role(Role::Admin))
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            tx.count_memberships(
                org_id,
                MembershipFilter::with_role(Role::Admin).and_status(MembershipStatus::Active)
            )
            .await
            .unwrap(),
            1
        );
        assert_eq!(tx.list_org_memberships(org_id).await.unwrap().len(), 4);
        assert!(tx.list_org_memberships(Uuid::now_v7()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_do_not_copy_state() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_organization(&org("Acme")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.open().await;
        assert!(tx.find_organization_by_slug("acme").await.unwrap().is_some());
        tx.count_memberships(Uuid::now_v7(), MembershipFilter::any())
            .await
            .unwrap();
        assert!(tx.working.is_none());

        tx.insert_organization(&org("Globex")).await.unwrap();
        assert!(tx.working.is_some());
        assert!(tx.find_organization_by_slug("globex").await.unwrap().is_some());
        assert!(store.state.try_lock().is_err());

        Box::new(tx).commit().await.unwrap();
        assert_eq!(store.organizations().await.len(), 2);
    }

    #[tokio::test]
    async fn test_read_only_commit_leaves_state() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_organization(&org("Acme")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.find_organization_by_name("Acme").await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.organizations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_transactions_are_serialized() {
        let store = InMemoryStore::new();
        let tx = store.begin().await.unwrap();

        let other = store.clone();
        let pending = tokio::spawn(async move { other.begin().await.map(|_| ()) });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        drop(tx);
        pending.await.unwrap().unwrap();
    }
}
