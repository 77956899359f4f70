//! # Resource Paths
//!
//! Resources are `/`-separated paths. A permission on a shorter path covers
//! every path below it, so `organization/acm` grants access to
//! `organization/acm/events` but not to `organization/acme`.

use serde::{Deserialize, Serialize};

/// Separator between resource path segments.
pub const SEPARATOR: char = '/';

/// Root segment of every organization resource.
pub const ORGANIZATION: &str = "organization";

/// Root segment of every role resource.
pub const ROLE: &str = "role";

/// A resource path such as `organization` or `organization/cssg`.
///
/// # Example
///
/// ```
/// use campus_rbac::resources::ResourcePath;
///
/// assert_eq!(ResourcePath::organizations().as_str(), "organization");
/// assert_eq!(ResourcePath::organization("cssg").as_str(), "organization/cssg");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ResourcePath(String);

impl ResourcePath {
    /// Wrap an arbitrary path.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The unscoped organization resource, checked by create and delete.
    pub fn organizations() -> Self {
        Self(ORGANIZATION.to_string())
    }

    /// The resource of one organization, keyed by slug.
    pub fn organization(slug: &str) -> Self {
        Self(format!("{ORGANIZATION}{SEPARATOR}{slug}"))
    }

    /// The unscoped role resource.
    pub fn roles() -> Self {
        Self(ROLE.to_string())
    }

    /// The resource of one role, keyed by name.
    pub fn role(name: &str) -> Self {
        Self(format!("{ROLE}{SEPARATOR}{name}"))
    }

    /// The path as checked by the engine.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourcePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
