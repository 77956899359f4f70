//! Unit of work
//!
//! Every public operation of the core runs inside one unit of work handed in
//! by the caller. The caller begins it, passes it to any number of service
//! calls, and commits it. Dropping an uncommitted unit discards its writes, so
//! every early return and error path rolls back.
//!
//! Uniqueness constraints (slug, onyen, pid, role name, membership pair,
//! assignment pair) are enforced here, not by the services: concurrent
//! requests are serialized by the store, and a duplicate insert surfaces as
//! [`StoreError::UniqueViolation`].

use async_trait::async_trait;
use campus_rbac::{GrantSource, Permission, Role, RoleAssignment};

use crate::error::StoreResult;
use crate::organization::{Article, Event, Organization};
use crate::user::User;

/// Marker returned by [`UnitOfWork::savepoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Savepoint(pub(crate) usize);

/// Factory for units of work.
#[async_trait]
pub trait Store: Send + Sync {
    /// Begin a new unit of work.
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;
}

/// Transactional access to every table the core touches.
///
/// Implementations also serve as the [`GrantSource`] of the permission
/// engine, so checks see the unit's own uncommitted writes.
#[async_trait]
pub trait UnitOfWork: GrantSource + Send {
    // === Organizations ===

    /// Every organization, ordered by id.
    async fn list_organizations(&mut self) -> StoreResult<Vec<Organization>>;

    /// Look up an organization by id.
    async fn find_organization(&mut self, id: i64) -> StoreResult<Option<Organization>>;

    /// Look up an organization by slug.
    async fn find_organization_by_slug(&mut self, slug: &str) -> StoreResult<Option<Organization>>;

    /// Look up an organization by display name.
    async fn find_organization_by_name(&mut self, name: &str) -> StoreResult<Option<Organization>>;

    /// Insert an organization under a freshly assigned id. The incoming id is ignored.
    async fn insert_organization(&mut self, organization: Organization) -> StoreResult<Organization>;

    /// Replace the row with the same id.
    async fn update_organization(&mut self, organization: Organization) -> StoreResult<Organization>;

    /// Delete the row with this id.
    async fn delete_organization(&mut self, id: i64) -> StoreResult<()>;

    // === Owned records ===

    /// Insert an event under a fresh id.
    async fn insert_event(&mut self, event: Event) -> StoreResult<Event>;

    /// Events owned by an organization, ordered by id.
    async fn list_events(&mut self, organization_id: i64) -> StoreResult<Vec<Event>>;

    /// Delete every event owned by an organization, returning the count.
    async fn delete_events_of(&mut self, organization_id: i64) -> StoreResult<usize>;

    /// Insert an article under a fresh id.
    async fn insert_article(&mut self, article: Article) -> StoreResult<Article>;

    /// Articles owned by an organization, ordered by id.
    async fn list_articles(&mut self, organization_id: i64) -> StoreResult<Vec<Article>>;

    /// Delete every article owned by an organization, returning the count.
    async fn delete_articles_of(&mut self, organization_id: i64) -> StoreResult<usize>;

    // === Users ===

    /// Insert a user under a fresh id.
    async fn insert_user(&mut self, user: User) -> StoreResult<User>;

    /// Look up a user by onyen.
    async fn find_user_by_onyen(&mut self, onyen: &str) -> StoreResult<Option<User>>;

    // === Memberships ===

    /// Record that `user_id` belongs to `organization_id`.
    async fn insert_membership(&mut self, user_id: i64, organization_id: i64) -> StoreResult<()>;

    /// Remove the pair, returning whether it existed.
    async fn delete_membership(&mut self, user_id: i64, organization_id: i64) -> StoreResult<bool>;

    /// Members of an organization, ordered by user id.
    async fn list_members(&mut self, organization_id: i64) -> StoreResult<Vec<User>>;

    /// Remove every membership of an organization, returning the former members' ids.
    async fn delete_memberships_of(&mut self, organization_id: i64) -> StoreResult<Vec<i64>>;

    // === Roles and permissions ===

    /// Insert a role under a fresh id.
    async fn insert_role(&mut self, role: Role) -> StoreResult<Role>;

    /// Look up a role by name.
    async fn find_role_by_name(&mut self, name: &str) -> StoreResult<Option<Role>>;

    /// Attach a permission to its role under a fresh id.
    async fn insert_permission(&mut self, permission: Permission) -> StoreResult<Permission>;

    /// Permissions owned by a role, ordered by id.
    async fn list_permissions(&mut self, role_id: i64) -> StoreResult<Vec<Permission>>;

    /// Assign a role to a user.
    async fn insert_assignment(&mut self, assignment: RoleAssignment) -> StoreResult<()>;

    /// Remove an assignment, returning whether it existed.
    async fn delete_assignment(&mut self, assignment: RoleAssignment) -> StoreResult<bool>;

    // === Transaction control ===

    /// Mark the current state so it can be restored with [`UnitOfWork::rollback_to`].
    async fn savepoint(&mut self) -> StoreResult<Savepoint>;

    /// Discard every write made since `savepoint`.
    async fn rollback_to(&mut self, savepoint: Savepoint) -> StoreResult<()>;

    /// Keep the writes made since `savepoint` and forget the mark.
    async fn release(&mut self, savepoint: Savepoint) -> StoreResult<()>;

    /// Publish every write. The unit cannot be used afterwards.
    async fn commit(&mut self) -> StoreResult<()>;
}
