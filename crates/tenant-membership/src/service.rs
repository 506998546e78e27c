//! Wiring of the evaluator, lifecycle manager and directory.

use crate::access::AccessEvaluator;
use crate::config::MembershipConfig;
use crate::directory::Directory;
use crate::error::MembershipResult;
use crate::lifecycle::LifecycleManager;
use crate::notify::Notifier;
use crate::store::MembershipStore;
use std::sync::Arc;
use tenant_auth::{InvitationCodec, JwtService, PasswordHasher};
use tenant_rbac::{PermissionCatalog, Route};
use tracing::{info, warn};

/// The engine's public surface, built from one configuration.
#[derive(Debug, Clone)]
pub struct TenantAccess {
    /// Request gate
    pub evaluator: AccessEvaluator,
    /// Membership transitions
    pub lifecycle: LifecycleManager,
    /// Listings
    pub directory: Directory,
}

impl TenantAccess {
    /// Build with the standard permission catalog.
    pub fn new(
        config: &MembershipConfig,
        store: Arc<dyn MembershipStore>,
        notifier: Arc<dyn Notifier>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> MembershipResult<Self> {
        Self::with_catalog(config, store, notifier, hasher, PermissionCatalog::standard())
    }

    /// Build with an explicit permission catalog, e.g. one loaded from
    /// role-permission rows.
    pub fn with_catalog(
        config: &MembershipConfig,
        store: Arc<dyn MembershipStore>,
        notifier: Arc<dyn Notifier>,
        hasher: Arc<dyn PasswordHasher>,
        catalog: PermissionCatalog,
    ) -> MembershipResult<Self> {
        let unreachable = catalog.unregistered(Route::ALL.iter().map(|r| (r.method(), r.path())));
        for permission in &unreachable {
            warn!(route = %permission, "Route granted to no role");
        }

        let jwt = Arc::new(JwtService::new(config.jwt_config())?);
        let codec = InvitationCodec::new(jwt.clone()).with_ttl(config.invitation_ttl());

        let evaluator = AccessEvaluator::new(store.clone(), Arc::new(catalog), jwt);
        let lifecycle = LifecycleManager::new(store.clone(), codec, hasher, notifier, config.templates());
        let directory = Directory::new(store);

        info!(app_url = %config.app_url, "Tenant access engine ready");
        Ok(Self {
            evaluator,
            lifecycle,
            directory,
        })
    }
}
