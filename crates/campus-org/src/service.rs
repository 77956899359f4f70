//! Organization store
//!
//! CRUD over organizations. Reads are public; create and delete require a
//! global grant on `organization`, update a grant scoped to the organization's
//! own resource path. Permission is checked before any organization data is
//! written, and before any is read except for the rename check in
//! [`OrganizationService::update`].

use std::sync::Arc;

use campus_rbac::{Action, PermissionEngine, ResourcePath, RoleAssignment};
use tracing::{debug, info};

use crate::error::{OrgError, OrgResult};
use crate::organization::{Organization, OrganizationDetails, Visibility};
use crate::roles::RoleService;
use crate::settings::CoreConfig;
use crate::store::UnitOfWork;
use crate::user::User;

/// Organization CRUD service.
///
/// # Examples
///
/// ```
/// use campus_org::{MemoryStore, Organization, OrganizationService, Store};
///
/// # async fn run() -> campus_org::OrgResult<()> {
/// let store = MemoryStore::new();
/// let service = OrganizationService::default();
///
/// let mut uow = store.begin().await?;
/// let all = service.all(uow.as_mut()).await?;
/// assert!(all.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct OrganizationService {
    engine: PermissionEngine,
    roles: RoleService,
    config: Arc<CoreConfig>,
}

impl OrganizationService {
    /// Create a service using `config` for member role provisioning.
    pub fn new(engine: PermissionEngine, config: Arc<CoreConfig>) -> Self {
        Self {
            engine,
            roles: RoleService::new(engine),
            config,
        }
    }

    /// Every organization, ordered by id.
    pub async fn all(&self, uow: &mut dyn UnitOfWork) -> OrgResult<Vec<Organization>> {
        let organizations = uow.list_organizations().await?;
        debug!(count = organizations.len(), "listed organizations");
        Ok(organizations)
    }

    /// The organization with this slug.
    pub async fn get_by_slug(&self, uow: &mut dyn UnitOfWork, slug: &str) -> OrgResult<Organization> {
        debug!(slug, "fetching organization");
        uow.find_organization_by_slug(slug)
            .await?
            .ok_or_else(|| OrgError::organization_not_found(slug))
    }

    /// The organization with this slug together with its events.
    pub async fn get_details_by_slug(
        &self,
        uow: &mut dyn UnitOfWork,
        slug: &str,
    ) -> OrgResult<OrganizationDetails> {
        let organization = self.get_by_slug(uow, slug).await?;
        let events = uow.list_events(organization.id).await?;
        Ok(OrganizationDetails {
            organization,
            events,
        })
    }

    /// The organization with this display name.
    pub async fn get_by_name(&self, uow: &mut dyn UnitOfWork, name: &str) -> OrgResult<Organization> {
        debug!(name, "fetching organization by name");
        uow.find_organization_by_name(name)
            .await?
            .ok_or_else(|| OrgError::NotFound(format!("No organization found with name: {name}")))
    }

    /// Membership visibility of the organization with this slug.
    pub async fn get_status_by_slug(&self, uow: &mut dyn UnitOfWork, slug: &str) -> OrgResult<Visibility> {
        Ok(self.get_by_slug(uow, slug).await?.public)
    }

    /// Create an organization.
    ///
    /// Any id on `organization` is discarded and the store assigns a fresh
    /// one. A taken slug surfaces as a unique violation.
    pub async fn create(
        &self,
        uow: &mut dyn UnitOfWork,
        subject: &User,
        organization: Organization,
    ) -> OrgResult<Organization> {
        self.engine
            .enforce(
                uow,
                subject,
                Action::OrganizationCreate.as_str(),
                ResourcePath::organizations().as_str(),
            )
            .await?;

        let savepoint = uow.savepoint().await?;
        match self.insert_and_provision(uow, organization).await {
            Ok(created) => {
                uow.release(savepoint).await?;
                info!(subject = %subject.onyen, slug = %created.slug, id = created.id, "organization created");
                Ok(created)
            }
            Err(e) => {
                uow.rollback_to(savepoint).await?;
                Err(e)
            }
        }
    }

    async fn insert_and_provision(
        &self,
        uow: &mut dyn UnitOfWork,
        mut organization: Organization,
    ) -> OrgResult<Organization> {
        organization.id = 0;
        let created = uow.insert_organization(organization).await?;

        if self.config.provision_member_roles {
            if let Some(role_name) = self.config.member_roles.role_for(&created.slug) {
                self.roles
                    .ensure_member_role(uow, &created.slug, &role_name)
                    .await?;
            }
        }
        Ok(created)
    }

    /// Replace every mutable field of the organization with the same id.
    ///
    /// The subject needs `organization.update` on the incoming slug, checked
    /// before anything is read. When the update renames the organization, a
    /// second check on the stored slug follows the lookup by id, since that
    /// slug is only known once the record is read; it still precedes every
    /// write. Renaming an organization that has members is refused.
    pub async fn update(
        &self,
        uow: &mut dyn UnitOfWork,
        subject: &User,
        organization: Organization,
    ) -> OrgResult<Organization> {
        self.enforce_update(uow, subject, &organization.slug).await?;

        let stored = if organization.is_persisted() {
            uow.find_organization(organization.id).await?
        } else {
            None
        };
        let Some(mut stored) = stored else {
            return Err(OrgError::NotFound(format!(
                "No organization found with id: {}",
                organization.id
            )));
        };

        if stored.slug != organization.slug {
            self.enforce_update(uow, subject, &stored.slug).await?;
            if !uow.list_members(stored.id).await?.is_empty() {
                return Err(OrgError::Conflict(format!(
                    "Organization `{}` has members and cannot change its slug",
                    stored.slug
                )));
            }
        }

        stored.replace_fields(&organization);
        let updated = uow.update_organization(stored).await?;
        info!(subject = %subject.onyen, slug = %updated.slug, id = updated.id, "organization updated");
        Ok(updated)
    }

    async fn enforce_update(&self, uow: &mut dyn UnitOfWork, subject: &User, slug: &str) -> OrgResult<()> {
        self.engine
            .enforce(
                uow,
                subject,
                Action::OrganizationUpdate.as_str(),
                ResourcePath::organization(slug).as_str(),
            )
            .await?;
        Ok(())
    }

    /// Delete the organization with this slug along with everything it owns.
    ///
    /// Events, articles, memberships, and the member role assignments of the
    /// former members go in the same unit of work.
    pub async fn delete(&self, uow: &mut dyn UnitOfWork, subject: &User, slug: &str) -> OrgResult<()> {
        self.engine
            .enforce(
                uow,
                subject,
                Action::OrganizationDelete.as_str(),
                ResourcePath::organizations().as_str(),
            )
            .await?;

        let organization = self.get_by_slug(uow, slug).await?;

        let savepoint = uow.savepoint().await?;
        match self.cascade_delete(uow, &organization).await {
            Ok(()) => {
                uow.release(savepoint).await?;
                info!(subject = %subject.onyen, slug, id = organization.id, "organization deleted");
                Ok(())
            }
            Err(e) => {
                uow.rollback_to(savepoint).await?;
                Err(e)
            }
        }
    }

    async fn cascade_delete(&self, uow: &mut dyn UnitOfWork, organization: &Organization) -> OrgResult<()> {
        let events = uow.delete_events_of(organization.id).await?;
        let articles = uow.delete_articles_of(organization.id).await?;
        let members = uow.delete_memberships_of(organization.id).await?;

        let mut revoked = 0;
        if let Some(role_name) = self.config.member_roles.role_for(&organization.slug) {
            if let Some(role) = uow.find_role_by_name(&role_name).await? {
                for user_id in &members {
                    if uow
                        .delete_assignment(RoleAssignment::new(*user_id, role.id))
                        .await?
                    {
                        revoked += 1;
                    }
                }
            }
        }

        uow.delete_organization(organization.id).await?;
        debug!(
            slug = %organization.slug,
            events,
            articles,
            members = members.len(),
            revoked,
            "removed organization records"
        );
        Ok(())
    }
}
