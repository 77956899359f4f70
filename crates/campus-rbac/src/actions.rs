//! # Actions
//!
//! Named actions checked by the organization and role services.
//! Actions are dotted strings (`organization.update`); permissions store
//! action *patterns* and are free to name actions outside this list.

use serde::{Deserialize, Serialize};

/// Actions the campus organization core asks the permission engine about.
///
/// The engine itself works on plain strings so that grants stored in the
/// database can name any action; this enum only gives the services a typed
/// vocabulary for the checks they perform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Action {
    /// Create a new organization.
    #[serde(rename = "organization.create")]
    OrganizationCreate,

    /// Replace the fields of an existing organization.
    #[serde(rename = "organization.update")]
    OrganizationUpdate,

    /// Delete an organization and everything it owns.
    #[serde(rename = "organization.delete")]
    OrganizationDelete,

    /// List the members of an organization.
    #[serde(rename = "organization.get_all_users")]
    OrganizationGetAllUsers,

    /// Add a user to an organization.
    #[serde(rename = "organization.add_membership")]
    OrganizationAddMembership,

    /// Remove a user from an organization.
    #[serde(rename = "organization.remove_membership")]
    OrganizationRemoveMembership,

    /// Create a new role.
    #[serde(rename = "role.create")]
    RoleCreate,

    /// Attach a permission to a role.
    #[serde(rename = "role.grant")]
    RoleGrant,

    /// Assign a role to, or take it away from, a user.
    #[serde(rename = "role.assign")]
    RoleAssign,
}

impl Action {
    /// Get the string representation checked against stored permissions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::OrganizationCreate => "organization.create",
            Action::OrganizationUpdate => "organization.update",
            Action::OrganizationDelete => "organization.delete",
            Action::OrganizationGetAllUsers => "organization.get_all_users",
            Action::OrganizationAddMembership => "organization.add_membership",
            Action::OrganizationRemoveMembership => "organization.remove_membership",
            Action::RoleCreate => "role.create",
            Action::RoleGrant => "role.grant",
            Action::RoleAssign => "role.assign",
        }
    }

    /// Parse an action from its string representation.
    ///
    /// # Example
    ///
    /// ```
    /// use campus_rbac::actions::Action;
    ///
    /// assert_eq!(Action::parse("organization.update"), Some(Action::OrganizationUpdate));
    /// assert_eq!(Action::parse("ORGANIZATION.DELETE"), Some(Action::OrganizationDelete));
    /// assert_eq!(Action::parse("organization.rename"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let lowered = s.to_lowercase();
        Self::all().into_iter().find(|a| a.as_str() == lowered)
    }

    /// Get all actions.
    pub fn all() -> Vec<Self> {
        vec![
            Action::OrganizationCreate,
            Action::OrganizationUpdate,
            Action::OrganizationDelete,
            Action::OrganizationGetAllUsers,
            Action::OrganizationAddMembership,
            Action::OrganizationRemoveMembership,
            Action::RoleCreate,
            Action::RoleGrant,
            Action::RoleAssign,
        ]
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
