//! Outbound notifications
//!
//! The lifecycle manager renders messages with [`MessageTemplates`] and
//! hands them to a [`Notifier`] only after the transition has committed.
//! Delivery and retry belong to the notifier.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tenant_org::{Organization, Role};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

/// Notification error types.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// The transport refused or failed to deliver the message
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// The notifier is not configured
    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Invitation with an accept link
    Invitation,
    /// Pending membership approved
    Approved,
    /// Pending membership rejected
    Rejected,
    /// Owners/admins asked to review a pending member
    ApprovalRequested,
    /// Owners/admins told a new member joined
    MemberJoined,
}

/// A rendered message addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Message kind
    pub kind: NotificationKind,
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html_body: String,
}

/// Delivers notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification.
    async fn send(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Renders the lifecycle notifications.
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    app_url: String,
    from: String,
    product: String,
}

impl MessageTemplates {
    /// Templates linking into `app_url`, sent from `from`.
    pub fn new(app_url: &str, from: &str, product: &str) -> Self {
        Self {
            app_url: app_url.trim_end_matches('/').to_string(),
            from: from.to_string(),
            product: product.to_string(),
        }
    }

    /// Link the invitee follows to accept.
    pub fn accept_link(&self, token: &str) -> String {
        format!("{}/accept-invitation/{}", self.app_url, token)
    }

    /// Link to an organization's home.
    pub fn org_link(&self, org: &Organization) -> String {
        format!("{}/o/{}", self.app_url, org.slug)
    }

    /// Link to a member's profile within an organization.
    pub fn profile_link(&self, org: &Organization, username: &str) -> String {
        format!("{}/o/{}/users/{}", self.app_url, org.slug, username.to_lowercase())
    }

    fn message(&self, kind: NotificationKind, to: &str, subject: String, body: String) -> Notification {
        Notification {
            kind,
            from: self.from.clone(),
            to: to.to_string(),
            subject,
            html_body: body,
        }
    }

    fn signature(&self) -> String {
        format!("Thank you, <br/>\n{} Team", self.product)
    }

    /// Invitation to join `org`.
    pub fn invitation(&self, to: &str, inviter_name: &str, org: &Organization, token: &str) -> Notification {
        let body = format!(
            "You've received an invitation!<br/><br/>\n\
             {} has invited you to join the Organization {}.<br/>\n\
             In order to access this Organization you must click the link below and continue registration: <br/><br/>\n\
             <a href='{}'>Accept Invitation</a><br/><br/>\n\
             {}",
            inviter_name,
            org.name,
            self.accept_link(token),
            self.signature()
        );
        self.message(
            NotificationKind::Invitation,
            to,
            format!("{}: You're invited to join {}", self.product, org.name),
            body,
        )
    }

    /// A pending membership was approved.
    pub fn approved(&self, to: &str, org: &Organization) -> Notification {
        let body = format!(
            "Hello from {}!<br/><br/>\n\
             Congratulations! You have now been approved by the Organization administrator to join {}!<br/><br/>\n\
             <a href='{}'>Explore Organization</a><br/><br/>\n\
             {}",
            self.product,
            org.name,
            self.org_link(org),
            self.signature()
        );
        self.message(
            NotificationKind::Approved,
            to,
            "Your account has been approved".to_string(),
            body,
        )
    }

    /// A pending membership was rejected.
    pub fn rejected(&self, to: &str, org: &Organization) -> Notification {
        let body = format!(
            "Hello from {}!<br/><br/>\n\
             Unfortunately, your account has been rejected by the Organization administrator in {}.<br/><br/>\n\
             {}",
            self.product,
            org.name,
            self.signature()
        );
        self.message(
            NotificationKind::Rejected,
            to,
            "Your account has been rejected".to_string(),
            body,
        )
    }

    /// Ask an owner or admin to review a pending member.
    pub fn approval_requested(
        &self,
        to: &str,
        inviter_name: &str,
        invitee_email: &str,
        role: Role,
        org: &Organization,
        profile_link: &str,
    ) -> Notification {
        let body = format!(
            "Hello from {}!<br/><br/>\n\
             {} has invited {} to join the Organization {} as {}.<br/>\n\
             Please click the link below to review and approve/deny the invitation: <br/><br/>\n\
             <a href='{}'>Approve Invitation</a><br/><br/>\n\
             {}",
            self.product,
            inviter_name,
            invitee_email,
            org.name,
            role.display_name(),
            profile_link,
            self.signature()
        );
        self.message(
            NotificationKind::ApprovalRequested,
            to,
            format!("{}: Request to approve new invited user.", self.product),
            body,
        )
    }

    /// Tell an owner or admin that a new member joined.
    pub fn member_joined(
        &self,
        to: &str,
        member_name: &str,
        role: Role,
        org: &Organization,
        profile_link: &str,
    ) -> Notification {
        let body = format!(
            "Hello from {}!<br/><br/>\n\
             New {} has joined your {} organization!<br/><br/>\n\
             Full Name: {}<br/>\n\
             User Type: {} <br/><br/>\n\
             <a href='{}'>View Profile</a><br/><br/>\n\
             {}",
            self.product,
            role.display_name(),
            org.name,
            member_name,
            role.display_name(),
            profile_link,
            self.signature()
        );
        self.message(
            NotificationKind::MemberJoined,
            to,
            format!("{} - New {} has joined {}", self.product, role.display_name(), org.name),
            body,
        )
    }
}

/// Notifier that only logs. Bodies are not logged since invitation bodies
/// carry bearer tokens.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        info!(
            kind = ?notification.kind,
            to = %notification.to,
            subject = %notification.subject,
            "Notification dispatched"
        );
        Ok(())
    }
}

/// Notifier that keeps every message it is given.
///
/// Used by tests and local tooling; can be switched to fail deliveries.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail (or stop failing) every delivery.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Messages delivered so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    /// Messages of one kind delivered so far.
    pub async fn sent_of(&self, kind: NotificationKind) -> Vec<Notification> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|n| n.kind == kind)
            .cloned()
            .collect()
    }

    /// Forget every recorded message.
    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery(format!(
                "mailbox {} unreachable",
                notification.to
            )));
        }
        self.sent.lock().await.push(notification);
        Ok(())
    }
}
