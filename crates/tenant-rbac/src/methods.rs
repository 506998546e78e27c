//! # HTTP Methods
//!
//! The request methods a permission can be granted for. Methods are matched
//! exactly as the router reports them: upper-case tokens, no aliases.

use serde::{Deserialize, Serialize};

/// HTTP request method of a route.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Read a resource
    Get,
    /// Create a resource or trigger an action
    Post,
    /// Replace or update a resource
    Put,
    /// Partially update a resource
    Patch,
    /// Remove a resource
    Delete,
}

impl HttpMethod {
    /// Get the wire representation of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Parse a method token exactly as the router supplies it.
    ///
    /// Matching is case-sensitive; the permission check uses the caller's
    /// method verbatim, so `"get"` is not `GET`.
    ///
    /// # Example
    ///
    /// ```
    /// use tenant_rbac::HttpMethod;
    ///
    /// assert_eq!(HttpMethod::parse("PUT"), Some(HttpMethod::Put));
    /// assert_eq!(HttpMethod::parse("put"), None);
    /// assert_eq!(HttpMethod::parse("OPTIONS"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    /// Check if this method leaves server state untouched.
    pub fn is_read_only(&self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
