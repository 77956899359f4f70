//! In-memory store
//!
//! Suitable for single-process deployments and testing. A unit of work holds
//! the store lock for its whole lifetime (single writer discipline) and works
//! on a private copy of the tables that replaces the shared copy on commit.

use async_trait::async_trait;
use campus_rbac::{GrantSource, Permission, RbacError, RbacResult, Role, RoleAssignment};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::organization::{Article, Event, Organization};
use crate::store::{Savepoint, Store, UnitOfWork};
use crate::user::User;

/// Id counters. Committed ids are never handed out twice.
#[derive(Debug, Clone, Default)]
struct Sequences {
    organization: i64,
    event: i64,
    article: i64,
    user: i64,
    role: i64,
    permission: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default)]
struct Tables {
    organizations: BTreeMap<i64, Organization>,
    events: BTreeMap<i64, Event>,
    articles: BTreeMap<i64, Article>,
    users: BTreeMap<i64, User>,
    roles: BTreeMap<i64, Role>,
    permissions: BTreeMap<i64, Permission>,
    /// (user_id, organization_id)
    memberships: BTreeSet<(i64, i64)>,
    assignments: BTreeSet<RoleAssignment>,
    sequences: Sequences,
}

impl Tables {
    fn slug_taken(&self, slug: &str, except_id: i64) -> bool {
        self.organizations
            .values()
            .any(|o| o.slug == slug && o.id != except_id)
    }

    fn require_organization(&self, id: i64) -> StoreResult<()> {
        if self.organizations.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity: "organization",
                key: format!("id {id}"),
            })
        }
    }

    fn require_user(&self, id: i64) -> StoreResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity: "user",
                key: format!("id {id}"),
            })
        }
    }

    fn require_role(&self, id: i64) -> StoreResult<()> {
        if self.roles.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity: "role",
                key: format!("id {id}"),
            })
        }
    }

    fn insert_organization(&mut self, mut organization: Organization) -> StoreResult<Organization> {
        if self.slug_taken(&organization.slug, 0) {
            return Err(StoreError::UniqueViolation {
                entity: "organization",
                field: "slug",
                value: organization.slug,
            });
        }
        organization.id = next_id(&mut self.sequences.organization);
        self.organizations.insert(organization.id, organization.clone());
        Ok(organization)
    }

    fn update_organization(&mut self, organization: Organization) -> StoreResult<Organization> {
        self.require_organization(organization.id)?;
        if self.slug_taken(&organization.slug, organization.id) {
            return Err(StoreError::UniqueViolation {
                entity: "organization",
                field: "slug",
                value: organization.slug,
            });
        }
        self.organizations.insert(organization.id, organization.clone());
        Ok(organization)
    }

    fn delete_organization(&mut self, id: i64) -> StoreResult<()> {
        self.require_organization(id)?;
        let referenced = self.events.values().any(|e| e.organization_id == id)
            || self.articles.values().any(|a| a.organization_id == id)
            || self.memberships.iter().any(|(_, org)| *org == id);
        if referenced {
            return Err(StoreError::ForeignKeyViolation {
                entity: "organization",
                detail: format!("organization {id} still owns events, articles, or memberships"),
            });
        }
        self.organizations.remove(&id);
        Ok(())
    }

    fn insert_user(&mut self, mut user: User) -> StoreResult<User> {
        if self.users.values().any(|u| u.onyen == user.onyen) {
            return Err(StoreError::UniqueViolation {
                entity: "user",
                field: "onyen",
                value: user.onyen,
            });
        }
        if self.users.values().any(|u| u.pid == user.pid) {
            return Err(StoreError::UniqueViolation {
                entity: "user",
                field: "pid",
                value: user.pid.to_string(),
            });
        }
        user.id = next_id(&mut self.sequences.user);
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn insert_membership(&mut self, user_id: i64, organization_id: i64) -> StoreResult<()> {
        self.require_user(user_id)?;
        self.require_organization(organization_id)?;
        if !self.memberships.insert((user_id, organization_id)) {
            return Err(StoreError::UniqueViolation {
                entity: "user_organization",
                field: "(user_id, organization_id)",
                value: format!("({user_id}, {organization_id})"),
            });
        }
        Ok(())
    }

    fn insert_role(&mut self, mut role: Role) -> StoreResult<Role> {
        if self.roles.values().any(|r| r.name == role.name) {
            return Err(StoreError::UniqueViolation {
                entity: "role",
                field: "name",
                value: role.name,
            });
        }
        role.id = next_id(&mut self.sequences.role);
        self.roles.insert(role.id, role.clone());
        Ok(role)
    }

    fn insert_permission(&mut self, mut permission: Permission) -> StoreResult<Permission> {
        self.require_role(permission.role_id)
            .map_err(|_| StoreError::ForeignKeyViolation {
                entity: "permission",
                detail: format!("role {} does not exist", permission.role_id),
            })?;
        permission.id = next_id(&mut self.sequences.permission);
        self.permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    fn insert_assignment(&mut self, assignment: RoleAssignment) -> StoreResult<()> {
        self.require_user(assignment.user_id)?;
        self.require_role(assignment.role_id)?;
        if !self.assignments.insert(assignment) {
            return Err(StoreError::UniqueViolation {
                entity: "user_role",
                field: "(user_id, role_id)",
                value: format!("({}, {})", assignment.user_id, assignment.role_id),
            });
        }
        Ok(())
    }

    fn grants_for(&self, user_id: i64) -> Vec<Permission> {
        let role_ids: BTreeSet<i64> = self
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.role_id)
            .collect();
        self.permissions
            .values()
            .filter(|p| role_ids.contains(&p.role_id))
            .cloned()
            .collect()
    }
}

/// In-memory store implementation.
///
/// # Examples
///
/// ```
/// use campus_org::{MemoryStore, Organization, Store, UnitOfWork};
///
/// # async fn run() -> campus_org::StoreResult<()> {
/// let store = MemoryStore::new();
/// let mut uow = store.begin().await?;
/// let org = uow.insert_organization(Organization::new("ACM", "ACM", "acm")).await?;
/// uow.commit().await?;
/// assert_eq!(org.id, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard: Some(guard),
            working,
            savepoints: Vec::new(),
        }))
    }
}

/// Unit of work over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryUnitOfWork {
    guard: Option<OwnedMutexGuard<Tables>>,
    working: Tables,
    savepoints: Vec<Tables>,
}

impl MemoryUnitOfWork {
    fn tables(&mut self) -> StoreResult<&mut Tables> {
        if self.guard.is_none() {
            return Err(StoreError::Finished);
        }
        Ok(&mut self.working)
    }

    fn check_savepoint(&self, savepoint: Savepoint) -> StoreResult<()> {
        if savepoint.0 >= self.savepoints.len() {
            return Err(StoreError::Internal(format!(
                "unknown savepoint {}",
                savepoint.0
            )));
        }
        Ok(())
    }
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        if self.guard.is_some() {
            debug!("unit of work dropped without commit, discarding writes");
        }
    }
}

#[async_trait]
impl GrantSource for MemoryUnitOfWork {
    async fn grants_for(&mut self, subject_id: i64) -> RbacResult<Vec<Permission>> {
        let tables = self
            .tables()
            .map_err(|e| RbacError::Source(e.to_string()))?;
        Ok(tables.grants_for(subject_id))
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn list_organizations(&mut self) -> StoreResult<Vec<Organization>> {
        Ok(self.tables()?.organizations.values().cloned().collect())
    }

    async fn find_organization(&mut self, id: i64) -> StoreResult<Option<Organization>> {
        Ok(self.tables()?.organizations.get(&id).cloned())
    }

    async fn find_organization_by_slug(&mut self, slug: &str) -> StoreResult<Option<Organization>> {
        Ok(self
            .tables()?
            .organizations
            .values()
            .find(|o| o.slug == slug)
            .cloned())
    }

    async fn find_organization_by_name(&mut self, name: &str) -> StoreResult<Option<Organization>> {
        Ok(self
            .tables()?
            .organizations
            .values()
            .find(|o| o.name == name)
            .cloned())
    }

    async fn insert_organization(&mut self, organization: Organization) -> StoreResult<Organization> {
        self.tables()?.insert_organization(organization)
    }

    async fn update_organization(&mut self, organization: Organization) -> StoreResult<Organization> {
        self.tables()?.update_organization(organization)
    }

    async fn delete_organization(&mut self, id: i64) -> StoreResult<()> {
        self.tables()?.delete_organization(id)
    }

    async fn insert_event(&mut self, mut event: Event) -> StoreResult<Event> {
        let tables = self.tables()?;
        tables.require_organization(event.organization_id)?;
        event.id = next_id(&mut tables.sequences.event);
        tables.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn list_events(&mut self, organization_id: i64) -> StoreResult<Vec<Event>> {
        Ok(self
            .tables()?
            .events
            .values()
            .filter(|e| e.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn delete_events_of(&mut self, organization_id: i64) -> StoreResult<usize> {
        let events = &mut self.tables()?.events;
        let before = events.len();
        events.retain(|_, e| e.organization_id != organization_id);
        Ok(before - events.len())
    }

    async fn insert_article(&mut self, mut article: Article) -> StoreResult<Article> {
        let tables = self.tables()?;
        tables.require_organization(article.organization_id)?;
        article.id = next_id(&mut tables.sequences.article);
        tables.articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn list_articles(&mut self, organization_id: i64) -> StoreResult<Vec<Article>> {
        Ok(self
            .tables()?
            .articles
            .values()
            .filter(|a| a.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn delete_articles_of(&mut self, organization_id: i64) -> StoreResult<usize> {
        let articles = &mut self.tables()?.articles;
        let before = articles.len();
        articles.retain(|_, a| a.organization_id != organization_id);
        Ok(before - articles.len())
    }

    async fn insert_user(&mut self, user: User) -> StoreResult<User> {
        self.tables()?.insert_user(user)
    }

    async fn find_user_by_onyen(&mut self, onyen: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|u| u.onyen == onyen)
            .cloned())
    }

    async fn insert_membership(&mut self, user_id: i64, organization_id: i64) -> StoreResult<()> {
        self.tables()?.insert_membership(user_id, organization_id)
    }

    async fn delete_membership(&mut self, user_id: i64, organization_id: i64) -> StoreResult<bool> {
        Ok(self.tables()?.memberships.remove(&(user_id, organization_id)))
    }

    async fn list_members(&mut self, organization_id: i64) -> StoreResult<Vec<User>> {
        let tables = self.tables()?;
        Ok(tables
            .memberships
            .iter()
            .filter(|(_, org)| *org == organization_id)
            .filter_map(|(user_id, _)| tables.users.get(user_id).cloned())
            .collect())
    }

    async fn delete_memberships_of(&mut self, organization_id: i64) -> StoreResult<Vec<i64>> {
        let memberships = &mut self.tables()?.memberships;
        let removed: Vec<i64> = memberships
            .iter()
            .filter(|(_, org)| *org == organization_id)
            .map(|(user_id, _)| *user_id)
            .collect();
        memberships.retain(|(_, org)| *org != organization_id);
        Ok(removed)
    }

    async fn insert_role(&mut self, role: Role) -> StoreResult<Role> {
        self.tables()?.insert_role(role)
    }

    async fn find_role_by_name(&mut self, name: &str) -> StoreResult<Option<Role>> {
        Ok(self
            .tables()?
            .roles
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn insert_permission(&mut self, permission: Permission) -> StoreResult<Permission> {
        self.tables()?.insert_permission(permission)
    }

    async fn list_permissions(&mut self, role_id: i64) -> StoreResult<Vec<Permission>> {
        Ok(self
            .tables()?
            .permissions
            .values()
            .filter(|p| p.role_id == role_id)
            .cloned()
            .collect())
    }

    async fn insert_assignment(&mut self, assignment: RoleAssignment) -> StoreResult<()> {
        self.tables()?.insert_assignment(assignment)
    }

    async fn delete_assignment(&mut self, assignment: RoleAssignment) -> StoreResult<bool> {
        Ok(self.tables()?.assignments.remove(&assignment))
    }

    async fn savepoint(&mut self) -> StoreResult<Savepoint> {
        let snapshot = self.tables()?.clone();
        self.savepoints.push(snapshot);
        Ok(Savepoint(self.savepoints.len() - 1))
    }

    async fn rollback_to(&mut self, savepoint: Savepoint) -> StoreResult<()> {
        self.tables()?;
        self.check_savepoint(savepoint)?;
        self.savepoints.truncate(savepoint.0 + 1);
        if let Some(snapshot) = self.savepoints.pop() {
            self.working = snapshot;
        }
        Ok(())
    }

    async fn release(&mut self, savepoint: Savepoint) -> StoreResult<()> {
        self.tables()?;
        self.check_savepoint(savepoint)?;
        self.savepoints.truncate(savepoint.0);
        Ok(())
    }

    async fn commit(&mut self) -> StoreResult<()> {
        let mut guard = self.guard.take().ok_or(StoreError::Finished)?;
        *guard = std::mem::take(&mut self.working);
        self.savepoints.clear();
        Ok(())
    }
}
