//! # Tenant RBAC (Route Permission Catalog)
//!
//! This crate provides the permission catalog of the tenant access engine:
//! which role may invoke which organization-scoped route.
//!
//! ## Overview
//!
//! The tenant-rbac crate handles:
//! - **Methods**: The HTTP methods a grant can name
//! - **Routes**: The guarded route table, keyed by method and path template
//! - **Permissions**: (method, path) pairs and role-permission rows
//! - **Catalog**: Role to permission mapping with deny-by-default checks
//!
//! ## Architecture
//!
//! ```text
//! Role ──RolePermission──▶ Permission = Method + Path template
//!
//! Examples:
//!   Owner  → PUT /api/o/:orgId/users/change-user-role
//!   Coach  → GET /api/o/:orgId/users/invite/:email/:roleId
//!   Guest  → GET /api/o/:orgId
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tenant_org::Role;
//! use tenant_rbac::{HttpMethod, PermissionCatalog, Route};
//!
//! let catalog = PermissionCatalog::standard();
//!
//! // Exact, verbatim match against the router's template
//! assert!(catalog.is_allowed(Role::Admin, "GET", "/api/o/:orgId/members"));
//!
//! // Fail fast on routes nobody can reach
//! let missing = catalog.unregistered(Route::ALL.map(|r| (r.method(), r.path())));
//! assert!(missing.is_empty());
//! ```
//!
//! ## Matching Rules
//!
//! - Method and path are compared verbatim, never normalized
//! - No wildcard or prefix matching
//! - Absence of a grant is a denial

pub mod methods;
pub mod permissions;
pub mod routes;

// Re-export main types for convenience
pub use methods::HttpMethod;
pub use permissions::{Permission, PermissionCatalog, RolePermission};
pub use routes::Route;
