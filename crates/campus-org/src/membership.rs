//! Membership coordination
//!
//! Adding or removing a member touches two tables: the membership pair and
//! the assignment of the organization's member role. Both writes happen under
//! one savepoint so that a user is never a member without the role, or the
//! other way around.
//!
//! Results come through two channels. A permission denial (or a broken
//! store) is an `Err`; anything else that prevents the change is reported as
//! [`MembershipOutcome::Rejected`] and leaves no writes behind.

use std::sync::Arc;

use campus_rbac::{Action, PermissionEngine, ResourcePath, Role, RoleAssignment};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::{OrgResult, StoreError};
use crate::organization::Organization;
use crate::settings::{CoreConfig, UnmappedSlug};
use crate::store::UnitOfWork;
use crate::user::User;

/// Why a membership mutation was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// The target user could not be resolved
    #[error("User does not exist")]
    UserMissing,

    /// No member role is configured for the organization
    #[error("No member role is configured for organization `{slug}`")]
    NoMemberRole {
        /// Organization slug
        slug: String,
    },

    /// The configured member role has not been created
    #[error("Member role `{role}` does not exist")]
    MemberRoleMissing {
        /// Role name
        role: String,
    },

    /// A store constraint refused the write
    #[error(transparent)]
    Store(StoreError),
}

/// Result of a membership mutation that passed its permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipOutcome {
    /// Both writes were made
    Applied,

    /// Nothing was written
    Rejected(RejectReason),
}

impl MembershipOutcome {
    /// `true` when the mutation was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, MembershipOutcome::Applied)
    }

    /// The rejection reason, if any.
    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            MembershipOutcome::Applied => None,
            MembershipOutcome::Rejected(reason) => Some(reason),
        }
    }
}

/// Add/remove members and answer membership questions.
#[derive(Debug, Clone, Default)]
pub struct MembershipCoordinator {
    engine: PermissionEngine,
    config: Arc<CoreConfig>,
}

impl MembershipCoordinator {
    /// Create a coordinator using `config` for member role resolution.
    pub fn new(engine: PermissionEngine, config: Arc<CoreConfig>) -> Self {
        Self { engine, config }
    }

    /// Members of `organization`.
    ///
    /// Requires `organization.get_all_users` on the organization.
    pub async fn get_all_users(
        &self,
        uow: &mut dyn UnitOfWork,
        subject: &User,
        organization: &Organization,
    ) -> OrgResult<Vec<User>> {
        let resource = ResourcePath::organization(&organization.slug);
        self.engine
            .enforce(
                uow,
                subject,
                Action::OrganizationGetAllUsers.as_str(),
                resource.as_str(),
            )
            .await?;

        let members = uow.list_members(organization.id).await?;
        debug!(slug = %organization.slug, count = members.len(), "listed members");
        Ok(members)
    }

    /// Whether `subject` leads `organization`, i.e. may update it.
    pub async fn is_leader(
        &self,
        uow: &mut dyn UnitOfWork,
        subject: &User,
        organization: &Organization,
    ) -> OrgResult<bool> {
        let resource = ResourcePath::organization(&organization.slug);
        Ok(self
            .engine
            .check(
                uow,
                subject,
                Action::OrganizationUpdate.as_str(),
                resource.as_str(),
            )
            .await?)
    }

    /// Make `user` a member of `organization` and grant the member role.
    pub async fn add_membership(
        &self,
        uow: &mut dyn UnitOfWork,
        subject: &User,
        user: Option<&User>,
        organization: &Organization,
    ) -> OrgResult<MembershipOutcome> {
        self.enforce(uow, subject, Action::OrganizationAddMembership, organization)
            .await?;

        let Some(user) = user else {
            return Ok(self.rejected("add", subject, None, organization, RejectReason::UserMissing));
        };

        let savepoint = uow.savepoint().await?;
        match self.apply_add(uow, user, organization).await {
            Ok(()) => {
                uow.release(savepoint).await?;
                info!(subject = %subject.onyen, user = %user.onyen, slug = %organization.slug, "membership added");
                Ok(MembershipOutcome::Applied)
            }
            Err(reason) => {
                uow.rollback_to(savepoint).await?;
                Ok(self.rejected("add", subject, Some(user), organization, reason))
            }
        }
    }

    /// Remove `user` from `organization` and take away the member role.
    pub async fn remove_membership(
        &self,
        uow: &mut dyn UnitOfWork,
        subject: &User,
        user: Option<&User>,
        organization: &Organization,
    ) -> OrgResult<MembershipOutcome> {
        self.enforce(uow, subject, Action::OrganizationRemoveMembership, organization)
            .await?;

        let Some(user) = user else {
            return Ok(self.rejected("remove", subject, None, organization, RejectReason::UserMissing));
        };

        let savepoint = uow.savepoint().await?;
        match self.apply_remove(uow, user, organization).await {
            Ok(()) => {
                uow.release(savepoint).await?;
                info!(subject = %subject.onyen, user = %user.onyen, slug = %organization.slug, "membership removed");
                Ok(MembershipOutcome::Applied)
            }
            Err(reason) => {
                uow.rollback_to(savepoint).await?;
                Ok(self.rejected("remove", subject, Some(user), organization, reason))
            }
        }
    }

    async fn enforce(
        &self,
        uow: &mut dyn UnitOfWork,
        subject: &User,
        action: Action,
        organization: &Organization,
    ) -> OrgResult<()> {
        let resource = ResourcePath::organization(&organization.slug);
        self.engine
            .enforce(uow, subject, action.as_str(), resource.as_str())
            .await?;
        Ok(())
    }

    async fn apply_add(
        &self,
        uow: &mut dyn UnitOfWork,
        user: &User,
        organization: &Organization,
    ) -> Result<(), RejectReason> {
        uow.insert_membership(user.id, organization.id)
            .await
            .map_err(RejectReason::Store)?;

        if let Some(role) = self.member_role(uow, organization).await? {
            uow.insert_assignment(RoleAssignment::new(user.id, role.id))
                .await
                .map_err(RejectReason::Store)?;
        }
        Ok(())
    }

    async fn apply_remove(
        &self,
        uow: &mut dyn UnitOfWork,
        user: &User,
        organization: &Organization,
    ) -> Result<(), RejectReason> {
        let removed = uow
            .delete_membership(user.id, organization.id)
            .await
            .map_err(RejectReason::Store)?;
        if !removed {
            debug!(user = %user.onyen, slug = %organization.slug, "user was not a member");
        }

        if let Some(role) = self.member_role(uow, organization).await? {
            let held = uow
                .delete_assignment(RoleAssignment::new(user.id, role.id))
                .await
                .map_err(RejectReason::Store)?;
            if !held {
                debug!(user = %user.onyen, role = %role.name, "user did not hold the member role");
            }
        }
        Ok(())
    }

    /// Resolve the member role of `organization`.
    ///
    /// `Ok(None)` means the membership pair is recorded without a role.
    async fn member_role(
        &self,
        uow: &mut dyn UnitOfWork,
        organization: &Organization,
    ) -> Result<Option<Role>, RejectReason> {
        let settings = &self.config.member_roles;
        let Some(name) = settings.role_for(&organization.slug) else {
            return match settings.unmapped {
                UnmappedSlug::Reject => Err(RejectReason::NoMemberRole {
                    slug: organization.slug.clone(),
                }),
                UnmappedSlug::MembershipOnly => Ok(None),
            };
        };

        match uow.find_role_by_name(&name).await {
            Ok(Some(role)) => Ok(Some(role)),
            Ok(None) => Err(RejectReason::MemberRoleMissing { role: name }),
            Err(e) => Err(RejectReason::Store(e)),
        }
    }

    fn rejected(
        &self,
        operation: &'static str,
        subject: &User,
        user: Option<&User>,
        organization: &Organization,
        reason: RejectReason,
    ) -> MembershipOutcome {
        warn!(
            operation,
            subject = %subject.onyen,
            user = user.map(|u| u.onyen.as_str()).unwrap_or("<none>"),
            slug = %organization.slug,
            %reason,
            "membership change rejected"
        );
        MembershipOutcome::Rejected(reason)
    }
}
