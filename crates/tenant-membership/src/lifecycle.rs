//! Membership lifecycle
//!
//! State machine for a membership row:
//!
//! ```text
//!   found org ──▶ active (Owner)
//!   invite    ──▶ invited ──accept──▶ active   (inviter Owner/Admin)
//!                         └─accept──▶ pending  (any other inviter)
//!   pending ──▶ active | rejected
//!   active  ◀─▶ inactive
//! ```
//!
//! Every transition re-checks its preconditions and writes inside a single
//! store transaction. Notifications go out after commit; a delivery failure
//! is reported as [`MembershipError::Notification`] but the transition stays
//! committed. Password hashing runs on the blocking pool before the
//! transaction opens, never under the store lock.

use crate::error::{MembershipError, MembershipResult};
use crate::notify::{MessageTemplates, Notification, Notifier};
use crate::store::{MembershipFilter, MembershipStore, StoreTransaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tenant_auth::{
    generate_password, InvitationClaims, InvitationCodec, PasswordHasher, GENERATED_PASSWORD_LEN,
};
use tenant_org::user::normalize_email;
use tenant_org::{Membership, MembershipStatus, Organization, Role, TierLimits, User};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Input for founding an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrganization {
    /// Organization name
    pub name: String,
    /// Size category
    pub size: String,
}

/// Result of founding an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundedOrganization {
    /// The new organization
    pub organization: Organization,
    /// The founder's owner membership
    pub owner: Membership,
}

/// A signed invitation and the row it points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    /// The invited membership row
    pub membership: Membership,
    /// Token embedded in the accept link
    pub token: String,
    /// When the token stops verifying
    pub expires_at: DateTime<Utc>,
}

/// Profile fields supplied when accepting an invitation.
///
/// Only used when the invitee has not registered yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInvitation {
    /// Chosen username
    #[serde(rename = "userName")]
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Chosen password
    pub password: String,
    /// Password confirmation
    pub confirm_password: String,
}

/// Result of accepting an invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedInvitation {
    /// Slug of the joined organization
    pub org_slug: String,
    /// Resulting membership status
    pub status: MembershipStatus,
    /// Role held in the organization
    #[serde(rename = "roleId")]
    pub role: Role,
    /// The invitation token, echoed for client roles only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Orchestrates membership transitions.
#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<dyn MembershipStore>,
    codec: InvitationCodec,
    hasher: Arc<dyn PasswordHasher>,
    notifier: Arc<dyn Notifier>,
    templates: MessageTemplates,
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("templates", &self.templates)
            .finish_non_exhaustive()
    }
}

impl LifecycleManager {
    /// Create a lifecycle manager.
    pub fn new(
        store: Arc<dyn MembershipStore>,
        codec: InvitationCodec,
        hasher: Arc<dyn PasswordHasher>,
        notifier: Arc<dyn Notifier>,
        templates: MessageTemplates,
    ) -> Self {
        Self {
            store,
            codec,
            hasher,
            notifier,
            templates,
        }
    }

    /// Create an organization with `owner_id` as its active Owner.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn found_organization(
        &self,
        owner_id: Uuid,
        request: NewOrganization,
    ) -> MembershipResult<FoundedOrganization> {
        let name = request.name.trim();
        let size = request.size.trim();
        if name.is_empty() {
            return Err(MembershipError::Validation("name is required".to_string()));
        }
        if size.is_empty() {
            return Err(MembershipError::Validation("size is required".to_string()));
        }

        let organization = Organization::new(name, size);
        if organization.slug.is_empty() {
            return Err(MembershipError::Validation(
                "name must contain at least one letter or digit".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;
        if tx.find_user(owner_id).await?.is_none() {
            return Err(MembershipError::NotFound(format!("user {}", owner_id)));
        }
        if tx.find_organization_by_slug(&organization.slug).await?.is_some() {
            return Err(MembershipError::Conflict(format!(
                "organization slug {} is taken",
                organization.slug
            )));
        }
        if tx.find_organization_by_name(&organization.name).await?.is_some() {
            return Err(MembershipError::Conflict(format!(
                "organization name {} is taken",
                organization.name
            )));
        }

        let owner = Membership::new(owner_id, organization.id, Role::Owner, MembershipStatus::Active);
        tx.insert_organization(&organization).await?;
        tx.insert_membership(&owner).await?;
        tx.commit().await?;

        info!(org_id = %organization.id, slug = %organization.slug, "Organization founded");
        Ok(FoundedOrganization { organization, owner })
    }

    /// Invite `email` into the inviter's organization with `role`.
    ///
    /// `inviter` is the caller's resolved membership. Invitations from
    /// owner-tier inviters activate on acceptance; all others need approval.
    #[instrument(
        skip(self, inviter, email),
        fields(org_id = %inviter.organization_id, inviter_id = %inviter.user_id)
    )]
    pub async fn invite_user(&self, inviter: &Membership, email: &str, role: Role) -> MembershipResult<Invitation> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(MembershipError::Validation("email is required".to_string()));
        }
        if !is_plausible_email(&email) {
            return Err(MembershipError::Validation(format!("invalid email {}", email)));
        }
        if !inviter.is_active() {
            return Err(MembershipError::AccessDenied("inviter membership is not active".to_string()));
        }

        // The placeholder credential is hashed before the store lock is taken.
        let placeholder_hash = if self.invite_precheck(inviter, &email).await? {
            None
        } else {
            Some(self.hash_password(generate_password(GENERATED_PASSWORD_LEN)).await?)
        };

        let mut tx = self.store.begin().await?;
        let inviter = match tx.find_membership(inviter.user_id, inviter.organization_id).await? {
            Some(current) if current.is_active() => current,
            _ => {
                return Err(MembershipError::AccessDenied(
                    "inviter membership is no longer active".to_string(),
                ))
            }
        };

        let auto_approve = inviter.role.is_owner_tier();
        let accept_status = if auto_approve {
            MembershipStatus::Active
        } else {
            MembershipStatus::Pending
        };

        let org = require_organization(tx.as_mut(), inviter.organization_id).await?;
        let inviter_user = tx
            .find_user(inviter.user_id)
            .await?
            .ok_or_else(|| MembershipError::NotFound(format!("user {}", inviter.user_id)))?;

        let existing_user = tx.find_user_by_email(&email).await?;
        let existing_membership = match &existing_user {
            Some(user) => tx.find_membership(user.id, org.id).await?,
            None => None,
        };

        let membership = match (existing_user, existing_membership) {
            (Some(_), Some(existing)) => {
                self.reinvite(tx.as_mut(), &org, existing, role, inviter.user_id)
                    .await?
            }
            (Some(user), None) => {
                ensure_capacity(tx.as_mut(), &org, role, None).await?;
                let membership = Membership::new(user.id, org.id, role, MembershipStatus::Invited)
                    .with_inviter(inviter.user_id);
                tx.insert_membership(&membership).await?;
                membership
            }
            (None, _) => {
                let password_hash = placeholder_hash.ok_or_else(|| {
                    MembershipError::Conflict("user record changed during invitation, retry".to_string())
                })?;
                ensure_capacity(tx.as_mut(), &org, role, None).await?;
                let user = User::pre_registered(email.clone(), password_hash, auto_approve);
                tx.insert_user(&user).await?;
                debug!(user_id = %user.id, "Pre-registration user created");

                let membership = Membership::new(user.id, org.id, role, MembershipStatus::Invited)
                    .with_inviter(inviter.user_id);
                tx.insert_membership(&membership).await?;
                membership
            }
        };

        let mut inviter_name = inviter_user.full_name();
        if inviter_name.is_empty() {
            inviter_name = org.name.clone();
        }
        let issued = self.codec.issue(&InvitationClaims {
            email: email.clone(),
            org_id: org.id,
            role,
            status: accept_status,
            inviter_full_name: inviter_name.clone(),
        })?;

        tx.commit().await?;
        info!(
            membership_id = %membership.id,
            accept_status = %accept_status,
            "User invited"
        );

        let invitation = Invitation {
            membership,
            token: issued.token,
            expires_at: issued.expires_at,
        };

        let message = self
            .templates
            .invitation(&email, &inviter_name, &org, &invitation.token);
        self.deliver(vec![message]).await?;

        Ok(invitation)
    }

    /// Reopen an existing row for a fresh invitation.
    ///
    /// An `invited` row is only reopened once its last token has lapsed.
    async fn reinvite(
        &self,
        tx: &mut dyn StoreTransaction,
        org: &Organization,
        mut existing: Membership,
        role: Role,
        inviter_id: Uuid,
    ) -> MembershipResult<Membership> {
        match existing.status {
            MembershipStatus::Active => Err(MembershipError::Conflict(
                "user already has an active role in this organization".to_string(),
            )),
            MembershipStatus::Invited if !self.invitation_lapsed(&existing) => Err(MembershipError::Conflict(
                "user has already been invited to this organization".to_string(),
            )),
            MembershipStatus::Pending => Err(MembershipError::Conflict(
                "user is awaiting approval in this organization".to_string(),
            )),
            MembershipStatus::Invited | MembershipStatus::Rejected | MembershipStatus::Inactive => {
                ensure_capacity(tx, org, role, Some(&existing)).await?;
                existing.set_role(role);
                existing.set_status(MembershipStatus::Invited);
                existing.invited_by = Some(inviter_id);
                tx.update_membership(&existing).await?;
                debug!(membership_id = %existing.id, "Membership reopened for invitation");
                Ok(existing)
            }
        }
    }

    /// Short read before an invite: rejects inviters that are no longer
    /// active and reports whether `email` already has an account.
    async fn invite_precheck(&self, inviter: &Membership, email: &str) -> MembershipResult<bool> {
        let mut tx = self.store.begin().await?;
        let current = tx.find_membership(inviter.user_id, inviter.organization_id).await?;
        if !current.is_some_and(|m| m.is_active()) {
            return Err(MembershipError::AccessDenied(
                "inviter membership is no longer active".to_string(),
            ));
        }
        Ok(tx.find_user_by_email(email).await?.is_some())
    }

    /// Whether the newest token for an `invited` row has expired.
    fn invitation_lapsed(&self, membership: &Membership) -> bool {
        Utc::now() - membership.updated_at >= self.codec.ttl()
    }

    /// Run the hasher on the blocking pool.
    async fn hash_password(&self, password: String) -> MembershipResult<String> {
        let hasher = self.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| MembershipError::Internal(format!("Task join error: {}", e)))??;
        Ok(hash)
    }

    /// Redeem an invitation token.
    ///
    /// Unregistered invitees complete registration with `profile`;
    /// registered invitees only have their membership status updated.
    #[instrument(skip_all)]
    pub async fn accept_invitation(
        &self,
        token: &str,
        profile: AcceptInvitation,
    ) -> MembershipResult<AcceptedInvitation> {
        if token.trim().is_empty() {
            return Err(MembershipError::Validation("token is required".to_string()));
        }
        let claims = self.codec.verify(token).map_err(|e| {
            debug!(error = %e, "Invitation token rejected");
            MembershipError::from(e)
        })?;
        if !matches!(claims.status, MembershipStatus::Active | MembershipStatus::Pending) {
            return Err(MembershipError::TokenInvalid(format!(
                "invitation carries unusable status {}",
                claims.status
            )));
        }

        let registration = match self.find_user_by_email(&claims.email).await? {
            Some(user) if !user.is_registered() => Some(self.prepare_registration(&profile).await?),
            _ => None,
        };

        let mut tx = self.store.begin().await?;
        let org = require_organization(tx.as_mut(), claims.org_id).await?;
        let mut user = tx
            .find_user_by_email(&claims.email)
            .await?
            .ok_or_else(|| MembershipError::NotFound(format!("user {}", claims.email)))?;
        let mut membership = tx
            .find_membership(user.id, org.id)
            .await?
            .ok_or_else(|| MembershipError::NotFound("invitation membership".to_string()))?;

        match membership.status {
            MembershipStatus::Invited => {}
            MembershipStatus::Active => {
                return Err(MembershipError::Conflict(
                    "user already has an active role in this organization".to_string(),
                ))
            }
            other => {
                return Err(MembershipError::Conflict(format!(
                    "invitation is no longer open, membership is {}",
                    other
                )))
            }
        }
        if membership.role != claims.role {
            return Err(MembershipError::Conflict(
                "invitation was superseded by a newer one".to_string(),
            ));
        }

        if !user.is_registered() {
            let registration = registration.ok_or_else(|| {
                MembershipError::Conflict("user record changed during acceptance, retry".to_string())
            })?;
            complete_registration(tx.as_mut(), &mut user, registration).await?;
        }

        membership.set_status(claims.status);
        tx.update_membership(&membership).await?;

        let mut recipients = Vec::new();
        for other in tx.list_org_memberships(org.id).await? {
            if other.user_id != user.id && other.is_active() && other.role.is_owner_tier() {
                if let Some(reviewer) = tx.find_user(other.user_id).await? {
                    recipients.push(reviewer.email);
                }
            }
        }

        tx.commit().await?;
        info!(
            org_id = %org.id,
            user_id = %user.id,
            status = %membership.status,
            "Invitation accepted"
        );

        let username = user.username.clone().unwrap_or_default();
        let profile_link = self.templates.profile_link(&org, &username);
        let messages = recipients
            .iter()
            .map(|to| {
                if membership.status == MembershipStatus::Pending {
                    self.templates.approval_requested(
                        to,
                        &claims.inviter_full_name,
                        &user.email,
                        membership.role,
                        &org,
                        &profile_link,
                    )
                } else {
                    self.templates
                        .member_joined(to, &user.full_name(), membership.role, &org, &profile_link)
                }
            })
            .collect();
        self.deliver(messages).await?;

        Ok(AcceptedInvitation {
            org_slug: org.slug,
            status: membership.status,
            role: membership.role,
            token: membership.role.is_client().then(|| token.to_string()),
        })
    }

    async fn find_user_by_email(&self, email: &str) -> MembershipResult<Option<User>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find_user_by_email(email).await?)
    }

    /// Validate the profile and hash its password outside any transaction.
    async fn prepare_registration(&self, profile: &AcceptInvitation) -> MembershipResult<Registration> {
        let username = profile.username.trim();
        if username.is_empty() {
            return Err(MembershipError::Validation("username is required".to_string()));
        }
        if profile.password.is_empty() {
            return Err(MembershipError::Validation("password is required".to_string()));
        }
        if profile.password != profile.confirm_password {
            return Err(MembershipError::Validation("passwords do not match".to_string()));
        }

        Ok(Registration {
            username: username.to_string(),
            first_name: profile.first_name.trim().to_string(),
            last_name: profile.last_name.trim().to_string(),
            password_hash: self.hash_password(profile.password.clone()).await?,
        })
    }

    /// Move a member to `new_status`.
    ///
    /// Allowed: pending to active or rejected, and active to or from
    /// inactive. The user's `active` flag follows the new status.
    #[instrument(skip(self))]
    pub async fn change_user_status(
        &self,
        org_id: Uuid,
        user_id: Uuid,
        new_status: MembershipStatus,
    ) -> MembershipResult<Membership> {
        if !matches!(
            new_status,
            MembershipStatus::Active | MembershipStatus::Inactive | MembershipStatus::Rejected
        ) {
            return Err(MembershipError::Validation(format!("invalid status {}", new_status)));
        }

        let mut tx = self.store.begin().await?;
        let mut user = tx
            .find_user(user_id)
            .await?
            .ok_or_else(|| MembershipError::NotFound(format!("user {}", user_id)))?;
        let org = require_organization(tx.as_mut(), org_id).await?;
        let mut membership = tx
            .find_membership(user_id, org_id)
            .await?
            .ok_or_else(|| MembershipError::NotFound("membership".to_string()))?;

        let current = membership.status;
        if current == new_status {
            return Err(MembershipError::Validation(format!(
                "user already has status {}",
                new_status
            )));
        }
        if !is_allowed_status_change(current, new_status) {
            return Err(MembershipError::Validation(format!(
                "cannot change status from {} to {}",
                current, new_status
            )));
        }

        user.active = new_status == MembershipStatus::Active;
        user.updated_at = Utc::now();
        tx.update_user(&user).await?;
        membership.set_status(new_status);
        tx.update_membership(&membership).await?;
        tx.commit().await?;

        info!(from = %current, to = %new_status, "Membership status changed");

        let message = match (current, new_status) {
            (MembershipStatus::Pending, MembershipStatus::Active) => {
                Some(self.templates.approved(&user.email, &org))
            }
            (MembershipStatus::Pending, MembershipStatus::Rejected) => {
                Some(self.templates.rejected(&user.email, &org))
            }
            _ => None,
        };
        self.deliver(message.into_iter().collect()).await?;

        Ok(membership)
    }

    /// Swap a member between Owner and Admin.
    #[instrument(skip(self))]
    pub async fn change_user_role(&self, org_id: Uuid, user_id: Uuid, new_role: Role) -> MembershipResult<Membership> {
        if !new_role.is_owner_tier() {
            return Err(MembershipError::Validation(format!(
                "role {} cannot be assigned by a role change",
                new_role.id()
            )));
        }

        let mut tx = self.store.begin().await?;
        let mut membership = tx
            .find_membership(user_id, org_id)
            .await?
            .ok_or_else(|| MembershipError::NotFound("membership".to_string()))?;

        let current = membership.role;
        if !current.is_owner_tier() {
            return Err(MembershipError::Validation(format!(
                "role {} cannot be changed",
                current.id()
            )));
        }
        if current == new_role {
            return Err(MembershipError::Validation(format!(
                "user already has role {}",
                new_role.id()
            )));
        }

        membership.set_role(new_role);
        tx.update_membership(&membership).await?;
        tx.commit().await?;

        info!(from = %current, to = %new_role, "Membership role changed");
        Ok(membership)
    }

    /// Send messages after commit. Every message is attempted; the first
    /// failure is reported.
    async fn deliver(&self, messages: Vec<Notification>) -> MembershipResult<()> {
        let mut first_failure = None;
        for message in messages {
            let kind = message.kind;
            let to = message.to.clone();
            if let Err(e) = self.notifier.send(message).await {
                error!(kind = ?kind, to = %to, error = %e, "Notification delivery failed");
                first_failure.get_or_insert(e);
            }
        }
        match first_failure {
            Some(e) => Err(MembershipError::Notification(e.to_string())),
            None => Ok(()),
        }
    }
}

/// Validated profile of an invitee completing registration.
struct Registration {
    username: String,
    first_name: String,
    last_name: String,
    password_hash: String,
}

async fn complete_registration(
    tx: &mut dyn StoreTransaction,
    user: &mut User,
    registration: Registration,
) -> MembershipResult<()> {
    if tx.find_user_by_username(&registration.username).await?.is_some() {
        return Err(MembershipError::Conflict(format!(
            "username {} is taken",
            registration.username
        )));
    }

    user.password_hash = registration.password_hash;
    user.username = Some(registration.username);
    user.first_name = registration.first_name;
    user.last_name = registration.last_name;
    user.verified_email = true;
    user.active = true;
    user.updated_at = Utc::now();
    tx.update_user(user).await?;
    debug!(user_id = %user.id, "Registration completed");
    Ok(())
}

async fn require_organization(tx: &mut dyn StoreTransaction, org_id: Uuid) -> MembershipResult<Organization> {
    tx.find_organization(org_id)
        .await?
        .ok_or_else(|| MembershipError::NotFound(format!("organization {}", org_id)))
}

/// Seat checks against the organization's tier.
///
/// `existing` is the row being reused, if any; it already occupies a seat
/// and only counts against a role limit when it already holds that role.
async fn ensure_capacity(
    tx: &mut dyn StoreTransaction,
    org: &Organization,
    role: Role,
    existing: Option<&Membership>,
) -> MembershipResult<()> {
    let limits = org.tier.limits();

    if existing.is_none() {
        let members = tx.count_memberships(org.id, MembershipFilter::any()).await?;
        if !TierLimits::has_room(limits.members, members) {
            warn!(org_id = %org.id, members, "Member limit reached");
            return Err(MembershipError::CapacityExceeded(
                "user creation has reached limit, consider upgrading your plan".to_string(),
            ));
        }
    }

    let role_limit = match role {
        Role::Admin => limits.admins.map(|l| (l, "admin")),
        r if r.is_mentor_tier() => limits.mentors.map(|l| (l, "mentor")),
        _ => None,
    };
    if let Some((limit, label)) = role_limit {
        if existing.is_some_and(|m| m.role == role) {
            return Ok(());
        }
        let holders = tx
            .count_memberships(org.id, MembershipFilter::with_role(role))
            .await?;
        if !TierLimits::has_room(Some(limit), holders) {
            warn!(org_id = %org.id, role = %role, holders, "Role limit reached");
            return Err(MembershipError::CapacityExceeded(format!(
                "{} roles have reached limit, consider upgrading your plan",
                label
            )));
        }
    }
    Ok(())
}

fn is_allowed_status_change(from: MembershipStatus, to: MembershipStatus) -> bool {
    use MembershipStatus::*;
    matches!(
        (from, to),
        (Pending, Active) | (Pending, Rejected) | (Active, Inactive) | (Inactive, Active)
    )
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_status_changes() {
        use MembershipStatus::*;
        assert!(is_allowed_status_change(Pending, Active));
        assert!(is_allowed_status_change(Pending, Rejected));
        assert!(is_allowed_status_change(Active, Inactive));
        assert!(is_allowed_status_change(Inactive, Active));

        assert!(!is_allowed_status_change(Invited, Active));
        assert!(!is_allowed_status_change(Rejected, Active));
        assert!(!is_allowed_status_change(Active, Rejected));
        assert!(!is_allowed_status_change(Inactive, Rejected));
    }

    #[test]
    fn test_plausible_email() {
        assert!(is_plausible_email("bob@x.com"));
        assert!(!is_plausible_email("bob"));
        assert!(!is_plausible_email("@x.com"));
        assert!(!is_plausible_email("bob@"));
        assert!(!is_plausible_email("bob@x@y"));
        assert!(!is_plausible_email("bo b@x.com"));
    }

    #[test]
    fn test_accepted_invitation_wire_shape() {
        let accepted = AcceptedInvitation {
            org_slug: "acme".to_string(),
            status: MembershipStatus::Pending,
            role: Role::Sme,
            token: None,
        };
        let json = serde_json::to_value(&accepted).unwrap();
        assert_eq!(json["orgSlug"], "acme");
        assert_eq!(json["roleId"], 4);
        assert!(json.get("token").is_none());
    }
}
