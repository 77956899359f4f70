//! Roles and role assignments
//!
//! A role is a named bundle of permissions. Users never hold permissions
//! directly; they hold roles through assignments.

use serde::{Deserialize, Serialize};

/// Name of the superuser role seeded with the `(*, *)` grant.
pub const ROOT_ROLE: &str = "root";

/// A named bundle of permissions.
///
/// # Examples
///
/// ```
/// use campus_rbac::Role;
///
/// let role = Role::new("cssg_members");
/// assert_eq!(role.id, 0);
/// assert!(!role.is_root());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Role {
    /// Identifier assigned by the store (0 until persisted)
    #[serde(default)]
    pub id: i64,

    /// Unique role name
    pub name: String,
}

impl Role {
    /// Creates an unpersisted role.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }

    /// Whether this is the superuser role.
    pub fn is_root(&self) -> bool {
        self.name == ROOT_ROLE
    }
}

/// A (user, role) pair. Its existence grants the user every permission of the role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleAssignment {
    /// Assigned user
    pub user_id: i64,

    /// Assigned role
    pub role_id: i64,
}

impl RoleAssignment {
    /// Creates a new assignment pair.
    pub fn new(user_id: i64, role_id: i64) -> Self {
        Self { user_id, role_id }
    }
}
