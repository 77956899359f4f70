//! # Permissions
//!
//! A permission grants an action pattern on a resource pattern and belongs to
//! exactly one role.

use serde::{Deserialize, Serialize};

use crate::resources::SEPARATOR;

/// Token matching any value in an action or resource position.
pub const WILDCARD: &str = "*";

/// Separator between action segments (`organization.update`).
pub const ACTION_SEPARATOR: char = '.';

/// A permission attached to a role.
///
/// Matching rules:
/// - **Action**: equal, the wildcard `*`, or a dotted pattern whose `*`
///   segments match one segment each. A trailing `*` matches every remaining
///   segment (`coworking.reservation.*`).
/// - **Resource**: equal, the wildcard `*`, or a `/`-segment prefix of the
///   requested resource. `*` segments match one segment.
///
/// # Example
///
/// ```
/// use campus_rbac::permissions::Permission;
///
/// let perm = Permission::new("organization.update", "organization/acm");
/// assert!(perm.matches("organization.update", "organization/acm"));
/// assert!(perm.matches("organization.update", "organization/acm/events"));
/// assert!(!perm.matches("organization.update", "organization/cssg"));
///
/// let root = Permission::new("*", "*");
/// assert!(root.matches("organization.delete", "organization"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Permission {
    /// Identifier assigned by the store (0 until persisted).
    #[serde(default)]
    pub id: i64,
    /// Action pattern.
    pub action: String,
    /// Resource pattern.
    pub resource: String,
    /// Owning role.
    #[serde(default)]
    pub role_id: i64,
}

impl Permission {
    /// Create an unpersisted permission not yet attached to a role.
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            id: 0,
            action: action.into(),
            resource: resource.into(),
            role_id: 0,
        }
    }

    /// Create an unpersisted permission owned by `role_id`.
    pub fn for_role(role_id: i64, action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            role_id,
            ..Self::new(action, resource)
        }
    }

    /// Whether this is the superuser grant `(*, *)`.
    pub fn is_root(&self) -> bool {
        self.action == WILDCARD && self.resource == WILDCARD
    }

    /// Check whether this permission covers `action` on `resource`.
    pub fn matches(&self, action: &str, resource: &str) -> bool {
        action_matches(&self.action, action) && resource_matches(&self.resource, resource)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.action, self.resource)
    }
}

/// Match a stored action pattern against a requested action.
pub fn action_matches(pattern: &str, action: &str) -> bool {
    if pattern == WILDCARD || pattern == action {
        return true;
    }
    let pattern: Vec<&str> = pattern.split(ACTION_SEPARATOR).collect();
    let action: Vec<&str> = action.split(ACTION_SEPARATOR).collect();
    segments_match(&pattern, &action, false)
}

/// Match a stored resource pattern against a requested resource.
pub fn resource_matches(pattern: &str, resource: &str) -> bool {
    if pattern == WILDCARD || pattern == resource {
        return true;
    }
    let pattern: Vec<&str> = pattern.split(SEPARATOR).collect();
    let resource: Vec<&str> = resource.split(SEPARATOR).collect();
    segments_match(&pattern, &resource, true)
}

/// Segment-wise comparison. With `allow_prefix` the pattern may be shorter
/// than the value; otherwise only a trailing `*` may absorb extra segments.
fn segments_match(pattern: &[&str], value: &[&str], allow_prefix: bool) -> bool {
    for (idx, segment) in pattern.iter().enumerate() {
        let Some(actual) = value.get(idx) else {
            return false;
        };
        if *segment == WILDCARD {
            if idx == pattern.len() - 1 {
                return true;
            }
            continue;
        }
        if segment != actual {
            return false;
        }
    }
    allow_prefix || pattern.len() == value.len()
}

/// The permissions a subject holds, gathered across all of its roles.
///
/// # Example
///
/// ```
/// use campus_rbac::permissions::{Permission, PermissionSet};
///
/// let set: PermissionSet = vec![
///     Permission::new("organization.get_all_users", "organization/cssg"),
///     Permission::new("checkin.create", "checkin"),
/// ]
/// .into_iter()
/// .collect();
///
/// assert!(set.allows("organization.get_all_users", "organization/cssg"));
/// assert!(!set.allows("organization.get_all_users", "organization/acm"));
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionSet {
    permissions: Vec<Permission>,
}

impl PermissionSet {
    /// Create a new empty permission set.
    pub fn new() -> Self {
        Self {
            permissions: Vec::new(),
        }
    }

    /// Add a permission. Duplicates (same action and resource) are ignored.
    pub fn add(&mut self, permission: Permission) {
        let duplicate = self
            .permissions
            .iter()
            .any(|p| p.action == permission.action && p.resource == permission.resource);
        if !duplicate {
            self.permissions.push(permission);
        }
    }

    /// Add multiple permissions.
    pub fn add_all<I>(&mut self, permissions: I)
    where
        I: IntoIterator<Item = Permission>,
    {
        for perm in permissions {
            self.add(perm);
        }
    }

    /// Find the first permission covering `action` on `resource`.
    pub fn find_match(&self, action: &str, resource: &str) -> Option<&Permission> {
        self.permissions.iter().find(|p| p.matches(action, resource))
    }

    /// Check whether any permission covers `action` on `resource`.
    pub fn allows(&self, action: &str, resource: &str) -> bool {
        self.find_match(action, resource).is_some()
    }

    /// Whether the set contains the `(*, *)` grant.
    pub fn has_root(&self) -> bool {
        self.permissions.iter().any(Permission::is_root)
    }

    /// Iterate over the permissions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// Get the count of permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        let mut set = PermissionSet::new();
        set.add_all(iter);
        set
    }
}
