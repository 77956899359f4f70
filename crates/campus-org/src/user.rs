//! Users as seen by the organization core
//!
//! Users are owned by an external user component. This core only reads
//! them: to evaluate permissions, to list members, and to resolve a login
//! handle ("onyen") into a user record.

use campus_rbac::Subject;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OrgError, OrgResult};
use crate::store::UnitOfWork;

/// A registered user.
///
/// # Examples
///
/// ```
/// use campus_org::User;
/// use campus_rbac::Subject;
///
/// let user = User::new(730233445, "root", "root@unc.edu");
/// assert_eq!(user.subject_name(), "root");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct User {
    /// Store identifier
    #[serde(default)]
    pub id: i64,

    /// Unique numeric person identifier
    pub pid: i64,

    /// Unique login handle
    pub onyen: String,

    /// Contact email
    pub email: String,

    /// Given name
    #[serde(default)]
    pub first_name: String,

    /// Family name
    #[serde(default)]
    pub last_name: String,

    /// Preferred pronouns
    #[serde(default)]
    pub pronouns: Option<String>,
}

impl User {
    /// Creates an unpersisted user.
    pub fn new(pid: i64, onyen: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            pid,
            onyen: onyen.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }
}

impl Subject for User {
    fn subject_id(&self) -> i64 {
        self.id
    }

    fn subject_name(&self) -> String {
        self.onyen.clone()
    }
}

/// Read access to the externally owned user records.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserDirectory;

impl UserDirectory {
    /// Create a new directory.
    pub fn new() -> Self {
        Self
    }

    /// Resolve a login handle into a user.
    ///
    /// Not permission-gated: any registered subject may resolve another user
    /// by onyen, e.g. to add them to an organization.
    pub async fn get_by_onyen(
        &self,
        uow: &mut dyn UnitOfWork,
        subject: &User,
        onyen: &str,
    ) -> OrgResult<User> {
        debug!(subject = %subject.onyen, onyen, "resolving user by onyen");
        uow.find_user_by_onyen(onyen)
            .await?
            .ok_or_else(|| OrgError::NotFound(format!("No user found with onyen: {onyen}")))
    }
}
