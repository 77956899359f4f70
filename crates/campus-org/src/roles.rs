//! Role and permission storage
//!
//! Roles are bundles of permissions; users receive them through assignments.
//! Administrative writes are gated like every other mutation. The member
//! role helpers are ungated and only called from inside operations that
//! already passed their own check.

use campus_rbac::{Action, Permission, PermissionEngine, ResourcePath, Role, RoleAssignment};
use tracing::{debug, info};

use crate::error::{OrgError, OrgResult};
use crate::store::UnitOfWork;
use crate::user::User;

/// Permissions every member role receives when it is provisioned.
///
/// # Examples
///
/// ```
/// use campus_org::roles::default_member_grants;
///
/// let grants = default_member_grants("cssg");
/// assert_eq!(grants[0].action, "organization.get_all_users");
/// assert_eq!(grants[0].resource, "organization/cssg");
/// ```
pub fn default_member_grants(slug: &str) -> Vec<Permission> {
    vec![Permission::new(
        Action::OrganizationGetAllUsers.as_str(),
        ResourcePath::organization(slug).as_str(),
    )]
}

/// Role/permission store.
#[derive(Debug, Clone, Default)]
pub struct RoleService {
    engine: PermissionEngine,
}

impl RoleService {
    /// Create a new role service.
    pub fn new(engine: PermissionEngine) -> Self {
        Self { engine }
    }

    /// Look up a role by name. Absence is not an error.
    pub async fn find_role_by_name(
        &self,
        uow: &mut dyn UnitOfWork,
        name: &str,
    ) -> OrgResult<Option<Role>> {
        Ok(uow.find_role_by_name(name).await?)
    }

    /// Look up a role by name, failing with `NotFound` when absent.
    pub async fn get_role(&self, uow: &mut dyn UnitOfWork, name: &str) -> OrgResult<Role> {
        self.find_role_by_name(uow, name)
            .await?
            .ok_or_else(|| OrgError::NotFound(format!("No role found with name: {name}")))
    }

    /// Permissions attached to a role.
    pub async fn permissions_of(
        &self,
        uow: &mut dyn UnitOfWork,
        role: &Role,
    ) -> OrgResult<Vec<Permission>> {
        Ok(uow.list_permissions(role.id).await?)
    }

    /// Create a new, empty role.
    pub async fn create_role(
        &self,
        uow: &mut dyn UnitOfWork,
        subject: &User,
        name: &str,
    ) -> OrgResult<Role> {
        self.engine
            .enforce(
                uow,
                subject,
                Action::RoleCreate.as_str(),
                ResourcePath::roles().as_str(),
            )
            .await?;

        let role = uow.insert_role(Role::new(name)).await?;
        info!(subject = %subject.onyen, role = %role.name, "role created");
        Ok(role)
    }

    /// Attach a permission to a role.
    pub async fn grant(
        &self,
        uow: &mut dyn UnitOfWork,
        subject: &User,
        role: &Role,
        action: &str,
        resource: &str,
    ) -> OrgResult<Permission> {
        self.engine
            .enforce(
                uow,
                subject,
                Action::RoleGrant.as_str(),
                ResourcePath::role(&role.name).as_str(),
            )
            .await?;

        let permission = uow
            .insert_permission(Permission::for_role(role.id, action, resource))
            .await?;
        info!(subject = %subject.onyen, role = %role.name, %permission, "permission granted");
        Ok(permission)
    }

    /// Assign a role to a user.
    pub async fn assign(
        &self,
        uow: &mut dyn UnitOfWork,
        subject: &User,
        user: &User,
        role: &Role,
    ) -> OrgResult<()> {
        self.enforce_assign(uow, subject, role).await?;
        uow.insert_assignment(RoleAssignment::new(user.id, role.id))
            .await?;
        info!(subject = %subject.onyen, user = %user.onyen, role = %role.name, "role assigned");
        Ok(())
    }

    /// Take a role away from a user, returning whether they held it.
    pub async fn unassign(
        &self,
        uow: &mut dyn UnitOfWork,
        subject: &User,
        user: &User,
        role: &Role,
    ) -> OrgResult<bool> {
        self.enforce_assign(uow, subject, role).await?;
        let removed = uow
            .delete_assignment(RoleAssignment::new(user.id, role.id))
            .await?;
        info!(subject = %subject.onyen, user = %user.onyen, role = %role.name, removed, "role unassigned");
        Ok(removed)
    }

    async fn enforce_assign(
        &self,
        uow: &mut dyn UnitOfWork,
        subject: &User,
        role: &Role,
    ) -> OrgResult<()> {
        self.engine
            .enforce(
                uow,
                subject,
                Action::RoleAssign.as_str(),
                ResourcePath::role(&role.name).as_str(),
            )
            .await?;
        Ok(())
    }

    /// Return the member role named `role_name`, creating it with
    /// [`default_member_grants`] for `slug` when it does not exist yet.
    pub async fn ensure_member_role(
        &self,
        uow: &mut dyn UnitOfWork,
        slug: &str,
        role_name: &str,
    ) -> OrgResult<Role> {
        if let Some(role) = uow.find_role_by_name(role_name).await? {
            debug!(slug, role = %role.name, "member role already exists");
            return Ok(role);
        }

        let role = uow.insert_role(Role::new(role_name)).await?;
        for grant in default_member_grants(slug) {
            uow.insert_permission(Permission::for_role(role.id, grant.action, grant.resource))
                .await?;
        }
        info!(slug, role = %role.name, "member role provisioned");
        Ok(role)
    }
}
