//! Shared fixture for the organization core scenario tests.
//!
//! Seeds the role and permission layout the campus deployment runs with:
//! a root role, an ambassadors role, leader and member roles for `cssg` and
//! `acm`, and one organization (`ackland`) without any roles.

#![allow(dead_code)]

use std::sync::Arc;

use campus_org::{
    CoreConfig, MemoryStore, MembershipCoordinator, Organization, OrganizationService, RoleService,
    Store, UnitOfWork, User, UserDirectory, Visibility,
};
use campus_rbac::{Permission, PermissionEngine, Role, RoleAssignment, ROOT_ROLE, WILDCARD};

/// Test fixture with a seeded store and the services under test.
pub struct TestFixture {
    /// Seeded store.
    pub store: MemoryStore,
    /// Holds `(*, *)`.
    pub root: User,
    /// Holds the ambassador grants only.
    pub ambassador: User,
    /// Leads cssg.
    pub leader: User,
    /// Member of cssg.
    pub member: User,
    /// No roles.
    pub student: User,
    /// CS+Social Good.
    pub cssg: Organization,
    /// Association for Computing Machinery.
    pub acm: Organization,
    /// Ackland Art Museum, no member role configured.
    pub ackland: Organization,
    /// Organization service.
    pub organizations: OrganizationService,
    /// Membership coordinator.
    pub memberships: MembershipCoordinator,
    /// Role service.
    pub roles: RoleService,
    /// User directory.
    pub users: UserDirectory,
}

impl TestFixture {
    /// Create a fixture with the default configuration.
    pub async fn new() -> Self {
        Self::with_config(CoreConfig::default()).await
    }

    /// Create a fixture with the given configuration.
    pub async fn with_config(config: CoreConfig) -> Self {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.expect("begin");
        let uow = uow.as_mut();

        let root = add_user(uow, 730233445, "root", "root@unc.edu").await;
        let ambassador = add_user(uow, 730299872, "ambassador", "amy@unc.edu").await;
        let leader = add_user(uow, 730299873, "leaderlee", "lee@unc.edu").await;
        let member = add_user(uow, 730299874, "membermary", "mary@unc.edu").await;
        let student = add_user(uow, 730299875, "student", "sally@unc.edu").await;

        let root_role = add_role(uow, ROOT_ROLE, &[(WILDCARD, WILDCARD)]).await;
        let ambassadors = add_role(
            uow,
            "ambassadors",
            &[
                ("checkin.create", "checkin"),
                ("coworking.reservation.*", "*"),
            ],
        )
        .await;
        let mut leader_roles = Vec::new();
        for slug in ["cssg", "acm"] {
            let resource = format!("organization/{slug}");
            let grants: Vec<(&str, &str)> = [
                "organization.update",
                "organization.add_membership",
                "organization.remove_membership",
                "organization.get_all_users",
            ]
            .into_iter()
            .map(|action| (action, resource.as_str()))
            .collect();
            leader_roles.push(add_role(uow, &format!("{slug}_leaders"), &grants).await);
        }
        let cssg_members = add_role(
            uow,
            "cssg_members",
            &[("organization.get_all_users", "organization/cssg")],
        )
        .await;
        add_role(
            uow,
            "acm_members",
            &[("organization.get_all_users", "organization/acm")],
        )
        .await;

        assign(uow, &root, &root_role).await;
        assign(uow, &ambassador, &ambassadors).await;
        assign(uow, &leader, &leader_roles[0]).await;
        assign(uow, &member, &cssg_members).await;

        let cssg = add_organization(
            uow,
            Organization::new("CS+Social Good", "CSSG", "cssg").with_application_required(true),
        )
        .await;
        let acm = add_organization(
            uow,
            Organization::new("Association for Computing Machinery", "ACM", "acm")
                .with_visibility(Visibility::Request),
        )
        .await;
        let ackland = add_organization(uow, Organization::new("Ackland Art Museum", "Ackland", "ackland")).await;

        uow.insert_membership(member.id, cssg.id)
            .await
            .expect("seed membership");
        uow.commit().await.expect("commit");

        let config = Arc::new(config);
        let engine = PermissionEngine::new();
        Self {
            store,
            root,
            ambassador,
            leader,
            member,
            student,
            cssg,
            acm,
            ackland,
            organizations: OrganizationService::new(engine, config.clone()),
            memberships: MembershipCoordinator::new(engine, config),
            roles: RoleService::new(engine),
            users: UserDirectory::new(),
        }
    }

    /// Begin a unit of work on the fixture store.
    pub async fn begin(&self) -> Box<dyn UnitOfWork> {
        self.store.begin().await.expect("begin")
    }

    /// Number of organizations currently committed.
    pub async fn organization_count(&self) -> usize {
        let mut uow = self.begin().await;
        self.organizations
            .all(uow.as_mut())
            .await
            .expect("list organizations")
            .len()
    }

    /// Onyens of the committed members of `organization`, as seen by root.
    pub async fn member_onyens(&self, organization: &Organization) -> Vec<String> {
        let mut uow = self.begin().await;
        self.memberships
            .get_all_users(uow.as_mut(), &self.root, organization)
            .await
            .expect("list members")
            .into_iter()
            .map(|user| user.onyen)
            .collect()
    }
}

async fn add_user(uow: &mut dyn UnitOfWork, pid: i64, onyen: &str, email: &str) -> User {
    uow.insert_user(User::new(pid, onyen, email))
        .await
        .expect("seed user")
}

async fn add_role(uow: &mut dyn UnitOfWork, name: &str, grants: &[(&str, &str)]) -> Role {
    let role = uow.insert_role(Role::new(name)).await.expect("seed role");
    for (action, resource) in grants {
        uow.insert_permission(Permission::for_role(role.id, *action, *resource))
            .await
            .expect("seed permission");
    }
    role
}

async fn assign(uow: &mut dyn UnitOfWork, user: &User, role: &Role) {
    uow.insert_assignment(RoleAssignment::new(user.id, role.id))
        .await
        .expect("seed assignment");
}

async fn add_organization(uow: &mut dyn UnitOfWork, organization: Organization) -> Organization {
    uow.insert_organization(organization)
        .await
        .expect("seed organization")
}
