//! Access evaluation
//!
//! Gatekeeping for organization-scoped routes runs in two ordered steps:
//!
//! 1. [`AccessEvaluator::attach_org_access`] resolves the caller's
//!    membership in the target organization and stores it in the
//!    [`RequestContext`].
//! 2. [`AccessEvaluator::require_route`] checks the resolved membership's
//!    role against the permission catalog.
//!
//! Only active memberships pass step 1. Step 2 without step 1 is a
//! programming error and fails with [`MembershipError::Internal`].

use crate::error::{MembershipError, MembershipResult};
use crate::store::MembershipStore;
use std::sync::Arc;
use tenant_auth::JwtService;
use tenant_org::Membership;
use tenant_rbac::{PermissionCatalog, Route};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Typed per-request state threaded from the gate into handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    user_id: Uuid,
    membership: Option<Membership>,
}

impl RequestContext {
    /// Context for an authenticated caller with no organization resolved yet.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            membership: None,
        }
    }

    /// The caller's user ID.
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// The resolved membership.
    ///
    /// Fails with `Internal` when no organization access was resolved.
    pub fn membership(&self) -> MembershipResult<&Membership> {
        self.membership.as_ref().ok_or_else(|| {
            MembershipError::Internal("route check before organization access was resolved".to_string())
        })
    }

    /// Whether organization access has been resolved.
    pub fn has_membership(&self) -> bool {
        self.membership.is_some()
    }
}

/// Resolves organization access and route permissions.
#[derive(Clone)]
pub struct AccessEvaluator {
    store: Arc<dyn MembershipStore>,
    catalog: Arc<PermissionCatalog>,
    jwt: Arc<JwtService>,
}

impl std::fmt::Debug for AccessEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessEvaluator")
            .field("permissions", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

impl AccessEvaluator {
    /// Create an evaluator over `store` and `catalog`.
    pub fn new(store: Arc<dyn MembershipStore>, catalog: Arc<PermissionCatalog>, jwt: Arc<JwtService>) -> Self {
        Self { store, catalog, jwt }
    }

    /// The catalog consulted by route checks.
    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Resolve the caller from an `Authorization` header value.
    ///
    /// Accepts `Bearer <token>` or a bare token.
    pub fn identify(&self, authorization: Option<&str>) -> MembershipResult<RequestContext> {
        let header = authorization
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| MembershipError::Unauthenticated("missing bearer token".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .unwrap_or(header);

        let user_id = self.jwt.authenticate(token).map_err(|e| {
            debug!(error = %e, "Bearer token rejected");
            MembershipError::Unauthenticated(e.to_string())
        })?;
        Ok(RequestContext::new(user_id))
    }

    /// Look up the caller's membership in `org_id`.
    ///
    /// Fails with `AccessDenied` when there is no row or the row is not active.
    #[instrument(skip(self))]
    pub async fn resolve_org_access(&self, user_id: Uuid, org_id: Uuid) -> MembershipResult<Membership> {
        let mut tx = self.store.begin().await?;
        let membership = tx.find_membership(user_id, org_id).await?;
        drop(tx);

        match membership {
            Some(m) if m.status.grants_access() => Ok(m),
            Some(m) => {
                debug!(status = %m.status, "Membership does not grant access");
                Err(MembershipError::AccessDenied(format!(
                    "membership in organization {} is {}",
                    org_id, m.status
                )))
            }
            None => Err(MembershipError::AccessDenied(format!(
                "not a member of organization {}",
                org_id
            ))),
        }
    }

    /// Resolve organization access and attach it to `ctx`.
    pub async fn attach_org_access(&self, ctx: &mut RequestContext, org_id: Uuid) -> MembershipResult<()> {
        let membership = self.resolve_org_access(ctx.user_id, org_id).await?;
        ctx.membership = Some(membership);
        Ok(())
    }

    /// Check `membership`'s role against the exact (method, path) pair.
    pub fn check_route_permission(&self, membership: &Membership, method: &str, path: &str) -> MembershipResult<()> {
        if self.catalog.is_allowed(membership.role, method, path) {
            Ok(())
        } else {
            warn!(
                user_id = %membership.user_id,
                org_id = %membership.organization_id,
                role = %membership.role,
                method,
                path,
                "Route not granted"
            );
            Err(MembershipError::PermissionDenied {
                role: membership.role,
                method: method.to_string(),
                path: path.to_string(),
            })
        }
    }

    /// Check the membership already resolved into `ctx` against a route.
    pub fn require_route<'a>(
        &self,
        ctx: &'a RequestContext,
        method: &str,
        path: &str,
    ) -> MembershipResult<&'a Membership> {
        let membership = ctx.membership()?;
        self.check_route_permission(membership, method, path)?;
        Ok(membership)
    }

    /// Both gate steps for a known route.
    pub async fn authorize(&self, ctx: &mut RequestContext, org_id: Uuid, route: Route) -> MembershipResult<()> {
        self.attach_org_access(ctx, org_id).await?;
        self.require_route(ctx, route.method().as_str(), route.path())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use tenant_org::{MembershipStatus, Role};

    const SECRET: &str = "test-secret-key-for-jwt-signing-minimum-32-chars";

    async fn setup(role: Role, status: MembershipStatus) -> (AccessEvaluator, Membership) {
        let store = InMemoryStore::new();
        let membership = Membership::new(Uuid::now_v7(), Uuid::now_v7(), role, status);
        let mut tx = store.begin().await.unwrap();
        tx.insert_membership(&membership).await.unwrap();
        tx.commit().await.unwrap();

        let evaluator = AccessEvaluator::new(
            Arc::new(store),
            Arc::new(PermissionCatalog::standard()),
            Arc::new(JwtService::with_secret(SECRET).unwrap()),
        );
        (evaluator, membership)
    }

    #[tokio::test]
    async fn test_active_membership_resolves() {
        let (evaluator, m) = setup(Role::Coach, MembershipStatus::Active).await;
        let resolved = evaluator.resolve_org_access(m.user_id, m.organization_id).await.unwrap();
        assert_eq!(resolved, m);
    }

    #[tokio::test]
    async fn test_non_active_statuses_denied() {
        for status in [
            MembershipStatus::Invited,
            MembershipStatus::Pending,
            MembershipStatus::Rejected,
            MembershipStatus::Inactive,
        ] {
            let (evaluator, m) = setup(Role::Owner, status).await;
            let result = evaluator.resolve_org_access(m.user_id, m.organization_id).await;
            assert!(matches!(result, Err(MembershipError::AccessDenied(_))), "{status}");
        }
    }

    #[tokio::test]
    async fn test_non_member_denied() {
        let (evaluator, m) = setup(Role::Owner, MembershipStatus::Active).await;
        let result = evaluator.resolve_org_access(Uuid::now_v7(), m.organization_id).await;
        assert!(matches!(result, Err(MembershipError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_route_denied_by_default() {
        let (evaluator, m) = setup(Role::Guest, MembershipStatus::Active).await;

        assert!(evaluator.check_route_permission(&m, "GET", "/api/o/:orgId").is_ok());
        let result = evaluator.check_route_permission(&m, "PUT", "/api/o/:orgId/users/change-user-role");
        assert!(matches!(result, Err(MembershipError::PermissionDenied { .. })));

        // Unknown routes and non-template paths are never granted
        assert!(evaluator.check_route_permission(&m, "GET", "/api/o/42").is_err());
        assert!(evaluator.check_route_permission(&m, "get", "/api/o/:orgId").is_err());
    }

    #[tokio::test]
    async fn test_route_check_requires_resolved_membership() {
        let (evaluator, m) = setup(Role::Owner, MembershipStatus::Active).await;
        let ctx = RequestContext::new(m.user_id);

        let result = evaluator.require_route(&ctx, "GET", "/api/o/:orgId");
        assert!(matches!(result, Err(MembershipError::Internal(_))));
    }

    #[tokio::test]
    async fn test_authorize_attaches_membership() {
        let (evaluator, m) = setup(Role::Admin, MembershipStatus::Active).await;
        let mut ctx = RequestContext::new(m.user_id);

        evaluator
            .authorize(&mut ctx, m.organization_id, Route::ChangeUserStatus)
            .await
            .unwrap();
        assert_eq!(ctx.membership().unwrap().role, Role::Admin);

        let result = evaluator.require_route(
            &ctx,
            Route::ChangeUserRole.method().as_str(),
            Route::ChangeUserRole.path(),
        );
        assert!(matches!(result, Err(MembershipError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn test_identify() {
        let (evaluator, _) = setup(Role::Owner, MembershipStatus::Active).await;
        let user_id = Uuid::now_v7();
        let token = evaluator.jwt.generate_access_token(user_id, "ann@x.io").unwrap();

        let ctx = evaluator.identify(Some(&format!("Bearer {}", token))).unwrap();
        assert_eq!(ctx.user_id(), user_id);
        assert!(!ctx.has_membership());

        assert!(matches!(evaluator.identify(None), Err(MembershipError::Unauthenticated(_))));
        assert!(matches!(
            evaluator.identify(Some("Bearer garbage")),
            Err(MembershipError::Unauthenticated(_))
        ));
    }
}
