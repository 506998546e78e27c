//! # Permissions
//!
//! A permission is an (HTTP method, route path template) pair. The
//! [`PermissionCatalog`] maps each role to the set of permissions it holds
//! and answers route checks by exact equality. Nothing is allowed unless a
//! grant for that exact pair exists.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tenant_org::Role;

use crate::methods::HttpMethod;
use crate::routes::Route;

/// A permission to invoke one route.
///
/// # Example
///
/// ```
/// use tenant_rbac::{HttpMethod, Permission};
///
/// let perm = Permission::new(HttpMethod::Put, "/api/o/:orgId/users/change-user-role");
/// assert_eq!(perm.to_string(), "PUT /api/o/:orgId/users/change-user-role");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permission {
    /// The HTTP method of the route.
    pub method: HttpMethod,
    /// The route path template, e.g. `/api/o/:orgId/members`.
    pub path: String,
}

impl Permission {
    /// Create a new permission.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// One row of the role-to-permission join.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RolePermission {
    /// The role holding the grant.
    pub role: Role,
    /// The granted permission.
    pub permission: Permission,
}

impl RolePermission {
    /// Create a new grant row.
    pub fn new(role: Role, permission: Permission) -> Self {
        Self { role, permission }
    }
}

/// The authoritative mapping from role to the routes it may invoke.
///
/// The catalog is built once at startup and only read afterwards, so it can
/// be shared behind an `Arc` without locking.
///
/// # Example
///
/// ```
/// use tenant_org::Role;
/// use tenant_rbac::{HttpMethod, PermissionCatalog, Route};
///
/// let catalog = PermissionCatalog::standard();
/// assert!(catalog.allows_route(Role::Owner, Route::ChangeUserRole));
/// assert!(!catalog.allows_route(Role::Guest, Route::InviteUser));
/// assert!(!catalog.is_allowed(Role::Owner, "GET", "/api/o/:orgId/unknown"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionCatalog {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl PermissionCatalog {
    /// Create an empty catalog that denies everything.
    pub fn new() -> Self {
        Self {
            grants: HashMap::new(),
        }
    }

    /// The catalog shipped with the service.
    ///
    /// - Owner: every organization route
    /// - Admin: every route except the Owner/Admin role swap
    /// - Coach, SME: view, list members, invite
    /// - Clients, Partner: view, list members
    /// - Guest: view
    pub fn standard() -> Self {
        let mut catalog = Self::new();

        catalog.grant_routes(Role::Owner, Route::ALL);
        catalog.grant_routes(
            Role::Admin,
            [
                Route::ViewOrganization,
                Route::ListMembers,
                Route::InviteUser,
                Route::ChangeUserStatus,
            ],
        );
        for role in [Role::Coach, Role::Sme] {
            catalog.grant_routes(
                role,
                [Route::ViewOrganization, Route::ListMembers, Route::InviteUser],
            );
        }
        for role in [
            Role::ClientAlumni,
            Role::ClientCurrent,
            Role::ClientFuture,
            Role::Partner,
        ] {
            catalog.grant_routes(role, [Route::ViewOrganization, Route::ListMembers]);
        }
        catalog.grant_route(Role::Guest, Route::ViewOrganization);

        catalog
    }

    /// Build a catalog from persisted role-permission rows.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = RolePermission>,
    {
        rows.into_iter().collect()
    }

    /// Grant a permission to a role.
    pub fn grant(&mut self, role: Role, permission: Permission) {
        self.grants.entry(role).or_default().insert(permission);
    }

    /// Grant a known route to a role.
    pub fn grant_route(&mut self, role: Role, route: Route) {
        self.grant(role, route.permission());
    }

    /// Grant several known routes to a role.
    pub fn grant_routes<I>(&mut self, role: Role, routes: I)
    where
        I: IntoIterator<Item = Route>,
    {
        for route in routes {
            self.grant_route(role, route);
        }
    }

    /// Revoke a permission from a role.
    ///
    /// # Returns
    ///
    /// `true` if the grant was present
    pub fn revoke(&mut self, role: Role, permission: &Permission) -> bool {
        self.grants
            .get_mut(&role)
            .map(|set| set.remove(permission))
            .unwrap_or(false)
    }

    /// Check whether `role` may invoke the route `method path`.
    ///
    /// Both values are compared verbatim against the grants: no case folding,
    /// no trailing-slash trimming, no prefix or wildcard matching. An
    /// unknown method or an absent grant denies.
    pub fn is_allowed(&self, role: Role, method: &str, path: &str) -> bool {
        let Some(method) = HttpMethod::parse(method) else {
            return false;
        };
        self.grants
            .get(&role)
            .map(|set| set.contains(&Permission::new(method, path)))
            .unwrap_or(false)
    }

    /// Check whether `role` may invoke a known route.
    pub fn allows_route(&self, role: Role, route: Route) -> bool {
        self.grants
            .get(&role)
            .map(|set| set.contains(&route.permission()))
            .unwrap_or(false)
    }

    /// Get the permissions held by a role, sorted.
    pub fn permissions_for(&self, role: Role) -> Vec<Permission> {
        let mut perms: Vec<Permission> = self
            .grants
            .get(&role)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        perms.sort();
        perms
    }

    /// Flatten the catalog into role-permission rows.
    pub fn rows(&self) -> Vec<RolePermission> {
        let mut rows: Vec<RolePermission> = self
            .grants
            .iter()
            .flat_map(|(role, set)| {
                set.iter()
                    .map(move |perm| RolePermission::new(*role, perm.clone()))
            })
            .collect();
        rows.sort_by(|a, b| (a.role, &a.permission).cmp(&(b.role, &b.permission)));
        rows
    }

    /// List the router routes that no role has been granted.
    ///
    /// Run at startup with every guarded route the router registers; a
    /// non-empty result means a route would deny every caller, which is
    /// almost always a path-template mismatch.
    pub fn unregistered<'a, I>(&self, routes: I) -> Vec<Permission>
    where
        I: IntoIterator<Item = (HttpMethod, &'a str)>,
    {
        let granted: HashSet<&Permission> = self.grants.values().flatten().collect();
        routes
            .into_iter()
            .map(|(method, path)| Permission::new(method, path))
            .filter(|perm| !granted.contains(perm))
            .collect()
    }

    /// Number of grant rows.
    pub fn len(&self) -> usize {
        self.grants.values().map(HashSet::len).sum()
    }

    /// Check if the catalog holds no grants.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<RolePermission> for PermissionCatalog {
    fn from_iter<T: IntoIterator<Item = RolePermission>>(iter: T) -> Self {
        let mut catalog = PermissionCatalog::new();
        for row in iter {
            catalog.grant(row.role, row.permission);
        }
        catalog
    }
}
