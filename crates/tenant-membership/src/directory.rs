//! Read-side queries over organizations and their members.

use crate::error::{MembershipError, MembershipResult};
use crate::store::MembershipStore;
use std::sync::Arc;
use tenant_org::{Membership, OrganizationMember, OrganizationSummary};
use tracing::{instrument, warn};
use uuid::Uuid;

/// Organization and member listings.
#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn MembershipStore>,
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory").finish_non_exhaustive()
    }
}

impl Directory {
    /// Create a directory over `store`.
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// Every organization `user_id` has a membership in, whatever its status.
    #[instrument(skip(self))]
    pub async fn list_user_organizations(&self, user_id: Uuid) -> MembershipResult<Vec<OrganizationSummary>> {
        let mut tx = self.store.begin().await?;
        let memberships = tx.list_user_memberships(user_id).await?;

        let mut summaries = Vec::with_capacity(memberships.len());
        for membership in memberships {
            match tx.find_organization(membership.organization_id).await? {
                Some(org) => summaries.push(OrganizationSummary {
                    id: org.id,
                    name: org.name,
                    slug: org.slug,
                    role: membership.role,
                    status: membership.status,
                }),
                None => warn!(org_id = %membership.organization_id, "Membership references missing organization"),
            }
        }
        Ok(summaries)
    }

    /// Members of the caller's organization with their public profiles.
    ///
    /// `caller` is the membership resolved by the access gate.
    #[instrument(skip(self, caller), fields(org_id = %caller.organization_id))]
    pub async fn list_members(&self, caller: &Membership) -> MembershipResult<Vec<OrganizationMember>> {
        if !caller.is_active() {
            return Err(MembershipError::AccessDenied("membership is not active".to_string()));
        }

        let mut tx = self.store.begin().await?;
        let memberships = tx.list_org_memberships(caller.organization_id).await?;

        let mut members = Vec::with_capacity(memberships.len());
        for membership in memberships {
            match tx.find_user(membership.user_id).await? {
                Some(user) => members.push(OrganizationMember {
                    user: user.profile(),
                    membership,
                }),
                None => warn!(user_id = %membership.user_id, "Membership references missing user"),
            }
        }
        Ok(members)
    }
}
