//! # Routes
//!
//! The organization-scoped routes of the service, keyed by method and the
//! path template the router resolves at request time. Handlers refer to
//! these variants instead of spelling paths, so a renamed route fails to
//! compile rather than silently losing its grants.

use serde::{Deserialize, Serialize};

use crate::methods::HttpMethod;
use crate::permissions::Permission;

/// Route-template segment naming the organization id.
pub const ORG_ID_PARAM: &str = "orgId";

/// An organization-scoped route guarded by the permission catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// View the organization.
    ViewOrganization,
    /// List members with their profiles.
    ListMembers,
    /// Invite an email address with a role.
    InviteUser,
    /// Swap a member between Owner and Admin.
    ChangeUserRole,
    /// Approve, reject, deactivate or reactivate a member.
    ChangeUserStatus,
}

impl Route {
    /// All guarded routes.
    pub const ALL: [Route; 5] = [
        Route::ViewOrganization,
        Route::ListMembers,
        Route::InviteUser,
        Route::ChangeUserRole,
        Route::ChangeUserStatus,
    ];

    /// The HTTP method of the route.
    pub fn method(&self) -> HttpMethod {
        match self {
            Route::ViewOrganization | Route::ListMembers | Route::InviteUser => HttpMethod::Get,
            Route::ChangeUserRole | Route::ChangeUserStatus => HttpMethod::Put,
        }
    }

    /// The path template, in the router's `:param` syntax.
    pub fn path(&self) -> &'static str {
        match self {
            Route::ViewOrganization => "/api/o/:orgId",
            Route::ListMembers => "/api/o/:orgId/members",
            Route::InviteUser => "/api/o/:orgId/users/invite/:email/:roleId",
            Route::ChangeUserRole => "/api/o/:orgId/users/change-user-role",
            Route::ChangeUserStatus => "/api/o/:orgId/users/change-user-status",
        }
    }

    /// The permission that grants this route.
    pub fn permission(&self) -> Permission {
        Permission::new(self.method(), self.path())
    }

    /// Find the route registered for an exact method and path template.
    ///
    /// # Example
    ///
    /// ```
    /// use tenant_rbac::{HttpMethod, Route};
    ///
    /// assert_eq!(
    ///     Route::lookup(HttpMethod::Get, "/api/o/:orgId/members"),
    ///     Some(Route::ListMembers)
    /// );
    /// assert_eq!(Route::lookup(HttpMethod::Get, "/api/o/7/members"), None);
    /// ```
    pub fn lookup(method: HttpMethod, path: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|route| route.method() == method && route.path() == path)
    }
}
