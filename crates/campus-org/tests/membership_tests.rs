//! Scenario tests for membership changes and the member role they carry.

mod common;

use campus_org::{
    CoreConfig, Endpoint, MemberRoleSettings, MembershipOutcome, RejectReason, UnmappedSlug,
};
use campus_rbac::{Action, PermissionEngine, ResourcePath, ROOT_ROLE};
use common::TestFixture;

// =============================================================================
// Add / remove
// =============================================================================

/// Leader adds a student to cssg, the student can then list members; the
/// leader removes them again and the grant goes with the membership.
#[tokio::test]
async fn test_cssg_add_then_remove() {
    let fixture = TestFixture::new().await;
    let engine = PermissionEngine::new();
    let cssg_resource = ResourcePath::organization("cssg");

    let mut uow = fixture.begin().await;
    let student = fixture
        .users
        .get_by_onyen(uow.as_mut(), &fixture.leader, "student")
        .await
        .unwrap();
    let outcome = fixture
        .memberships
        .add_membership(uow.as_mut(), &fixture.leader, Some(&student), &fixture.cssg)
        .await
        .unwrap();
    assert!(outcome.is_applied());
    assert!(engine
        .check(
            uow.as_mut(),
            &student,
            Action::OrganizationGetAllUsers.as_str(),
            cssg_resource.as_str(),
        )
        .await
        .unwrap());
    uow.commit().await.unwrap();

    assert_eq!(fixture.member_onyens(&fixture.cssg).await, ["membermary", "student"]);

    let mut uow = fixture.begin().await;
    let outcome = fixture
        .memberships
        .remove_membership(uow.as_mut(), &fixture.leader, Some(&student), &fixture.cssg)
        .await
        .unwrap();
    assert_eq!(outcome, MembershipOutcome::Applied);
    assert!(!engine
        .check(
            uow.as_mut(),
            &student,
            Action::OrganizationGetAllUsers.as_str(),
            cssg_resource.as_str(),
        )
        .await
        .unwrap());
    uow.commit().await.unwrap();

    assert_eq!(fixture.member_onyens(&fixture.cssg).await, ["membermary"]);
}

#[tokio::test]
async fn test_duplicate_add_keeps_one_row() {
    let fixture = TestFixture::new().await;
    let mut uow = fixture.begin().await;

    let outcome = fixture
        .memberships
        .add_membership(uow.as_mut(), &fixture.leader, Some(&fixture.member), &fixture.cssg)
        .await
        .unwrap();
    match outcome {
        MembershipOutcome::Rejected(RejectReason::Store(err)) => {
            assert!(err.is_unique_violation());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    uow.commit().await.unwrap();

    assert_eq!(fixture.member_onyens(&fixture.cssg).await, ["membermary"]);
}

#[tokio::test]
async fn test_acm_member_gets_acm_role() {
    let fixture = TestFixture::new().await;
    let mut uow = fixture.begin().await;

    let outcome = fixture
        .memberships
        .add_membership(uow.as_mut(), &fixture.root, Some(&fixture.student), &fixture.acm)
        .await
        .unwrap();
    assert!(outcome.is_applied());

    let grants = PermissionEngine::new()
        .grants(uow.as_mut(), &fixture.student)
        .await
        .unwrap();
    assert!(grants.allows("organization.get_all_users", "organization/acm"));
    assert!(!grants.allows("organization.get_all_users", "organization/cssg"));
}

/// Removing a user who never joined succeeds without touching other members.
#[tokio::test]
async fn test_remove_non_member_succeeds() {
    let fixture = TestFixture::new().await;
    let mut uow = fixture.begin().await;

    let outcome = fixture
        .memberships
        .remove_membership(uow.as_mut(), &fixture.root, Some(&fixture.student), &fixture.cssg)
        .await
        .unwrap();
    assert_eq!(outcome, MembershipOutcome::Applied);
    uow.commit().await.unwrap();

    assert_eq!(fixture.member_onyens(&fixture.cssg).await, ["membermary"]);
}

// =============================================================================
// Failure channels
// =============================================================================

#[tokio::test]
async fn test_denied_subject_gets_hard_error() {
    let fixture = TestFixture::new().await;
    let mut uow = fixture.begin().await;

    let err = fixture
        .memberships
        .add_membership(uow.as_mut(), &fixture.student, Some(&fixture.student), &fixture.cssg)
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());
    assert_eq!(err.status_code_for(Endpoint::AddMembership), 403);

    // leaderlee holds no grants on acm
    let err = fixture
        .memberships
        .remove_membership(uow.as_mut(), &fixture.leader, Some(&fixture.member), &fixture.acm)
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());
    drop(uow);

    assert_eq!(fixture.member_onyens(&fixture.cssg).await, ["membermary"]);
}

#[tokio::test]
async fn test_unknown_user_is_soft_failure() {
    let fixture = TestFixture::new().await;
    let mut uow = fixture.begin().await;

    let lookup = fixture
        .users
        .get_by_onyen(uow.as_mut(), &fixture.leader, "nobody")
        .await;
    let err = lookup.as_ref().unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status_code_for(Endpoint::AddMembership), 405);

    let outcome = fixture
        .memberships
        .add_membership(uow.as_mut(), &fixture.leader, lookup.as_ref().ok(), &fixture.cssg)
        .await
        .unwrap();
    assert_eq!(outcome, MembershipOutcome::Rejected(RejectReason::UserMissing));
}

#[tokio::test]
async fn test_unmapped_slug_is_rejected_by_default() {
    let fixture = TestFixture::new().await;
    let mut uow = fixture.begin().await;

    let outcome = fixture
        .memberships
        .add_membership(uow.as_mut(), &fixture.root, Some(&fixture.student), &fixture.ackland)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        MembershipOutcome::Rejected(RejectReason::NoMemberRole {
            slug: "ackland".into()
        })
    );
    uow.commit().await.unwrap();

    assert!(fixture.member_onyens(&fixture.ackland).await.is_empty());
}

#[tokio::test]
async fn test_unmapped_slug_membership_only() {
    let mut member_roles = MemberRoleSettings::default();
    member_roles.unmapped = UnmappedSlug::MembershipOnly;
    let fixture = TestFixture::with_config(CoreConfig {
        member_roles,
        ..CoreConfig::default()
    })
    .await;
    let mut uow = fixture.begin().await;

    let outcome = fixture
        .memberships
        .add_membership(uow.as_mut(), &fixture.root, Some(&fixture.student), &fixture.ackland)
        .await
        .unwrap();
    assert!(outcome.is_applied());
    uow.commit().await.unwrap();

    assert_eq!(fixture.member_onyens(&fixture.ackland).await, ["student"]);
}

#[tokio::test]
async fn test_convention_policy_needs_existing_role() {
    let fixture = TestFixture::with_config(CoreConfig {
        member_roles: MemberRoleSettings::convention(),
        ..CoreConfig::default()
    })
    .await;
    let mut uow = fixture.begin().await;

    let outcome = fixture
        .memberships
        .add_membership(uow.as_mut(), &fixture.root, Some(&fixture.student), &fixture.ackland)
        .await
        .unwrap();
    assert_eq!(
        outcome.reason(),
        Some(&RejectReason::MemberRoleMissing {
            role: "ackland_members".into()
        })
    );

    fixture
        .roles
        .ensure_member_role(uow.as_mut(), "ackland", "ackland_members")
        .await
        .unwrap();
    let outcome = fixture
        .memberships
        .add_membership(uow.as_mut(), &fixture.root, Some(&fixture.student), &fixture.ackland)
        .await
        .unwrap();
    assert!(outcome.is_applied());
}

// =============================================================================
// Leadership and member listing
// =============================================================================

#[tokio::test]
async fn test_is_leader_is_derived_from_update_grant() {
    let fixture = TestFixture::new().await;
    let mut uow = fixture.begin().await;

    let cases = [
        (&fixture.root, &fixture.cssg, true),
        (&fixture.leader, &fixture.cssg, true),
        (&fixture.leader, &fixture.acm, false),
        (&fixture.member, &fixture.cssg, false),
        (&fixture.ambassador, &fixture.cssg, false),
    ];
    for (subject, organization, expected) in cases {
        let leads = fixture
            .memberships
            .is_leader(uow.as_mut(), subject, organization)
            .await
            .unwrap();
        assert_eq!(leads, expected, "{} on {}", subject.onyen, organization.slug);
    }
}

#[tokio::test]
async fn test_member_listing_requires_grant() {
    let fixture = TestFixture::new().await;
    let mut uow = fixture.begin().await;

    let members = fixture
        .memberships
        .get_all_users(uow.as_mut(), &fixture.member, &fixture.cssg)
        .await
        .unwrap();
    assert_eq!(members.len(), 1);

    let err = fixture
        .memberships
        .get_all_users(uow.as_mut(), &fixture.student, &fixture.cssg)
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());
    assert_eq!(err.status_code_for(Endpoint::Members), 403);
}

// =============================================================================
// Engine laws over seeded grants
// =============================================================================

#[tokio::test]
async fn test_enforce_agrees_with_check_for_every_seeded_user() {
    let fixture = TestFixture::new().await;
    let engine = PermissionEngine::new();
    let mut uow = fixture.begin().await;

    let subjects = [
        &fixture.root,
        &fixture.ambassador,
        &fixture.leader,
        &fixture.member,
        &fixture.student,
    ];
    let requests = [
        ("organization.create", "organization".to_string()),
        ("organization.delete", "organization".to_string()),
        ("organization.update", "organization/cssg".to_string()),
        ("organization.update", "organization/acm".to_string()),
        ("organization.get_all_users", "organization/cssg".to_string()),
        ("checkin.create", "checkin".to_string()),
        ("coworking.reservation.read", "user/7".to_string()),
    ];

    for subject in subjects {
        for (action, resource) in &requests {
            let allowed = engine
                .check(uow.as_mut(), subject, action, resource)
                .await
                .unwrap();
            let enforced = engine.enforce(uow.as_mut(), subject, action, resource).await;
            assert_eq!(allowed, enforced.is_ok(), "{} {action} {resource}", subject.onyen);
        }
    }
}

#[tokio::test]
async fn test_ambassador_wildcards() {
    let fixture = TestFixture::new().await;
    let engine = PermissionEngine::new();
    let mut uow = fixture.begin().await;

    for (action, resource, expected) in [
        ("coworking.reservation.read", "user/7", true),
        ("coworking.reservation.manage", "reservation/12", true),
        ("coworking.operating_hours.create", "coworking", false),
        ("checkin.create", "checkin", true),
        ("checkin.delete", "checkin", false),
    ] {
        let allowed = engine
            .check(uow.as_mut(), &fixture.ambassador, action, resource)
            .await
            .unwrap();
        assert_eq!(allowed, expected, "{action} {resource}");
    }
}

#[tokio::test]
async fn test_prefix_grant_covers_every_organization() {
    let fixture = TestFixture::new().await;
    let engine = PermissionEngine::new();
    let mut uow = fixture.begin().await;

    let role = fixture
        .roles
        .create_role(uow.as_mut(), &fixture.root, "organization_editors")
        .await
        .unwrap();
    fixture
        .roles
        .grant(uow.as_mut(), &fixture.root, &role, "organization.update", "organization")
        .await
        .unwrap();
    fixture
        .roles
        .assign(uow.as_mut(), &fixture.root, &fixture.student, &role)
        .await
        .unwrap();

    for organization in [&fixture.cssg, &fixture.acm, &fixture.ackland] {
        assert!(fixture
            .memberships
            .is_leader(uow.as_mut(), &fixture.student, organization)
            .await
            .unwrap());
    }
    // segment aligned: "organizations" is not under "organization"
    assert!(!engine
        .check(uow.as_mut(), &fixture.student, "organization.update", "organizations/cssg")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_leader_cannot_manage_roles() {
    let fixture = TestFixture::new().await;
    let mut uow = fixture.begin().await;

    let err = fixture
        .roles
        .create_role(uow.as_mut(), &fixture.leader, "cssg_admins")
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());

    let role = fixture
        .roles
        .get_role(uow.as_mut(), "cssg_members")
        .await
        .unwrap();
    let err = fixture
        .roles
        .assign(uow.as_mut(), &fixture.leader, &fixture.student, &role)
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());
}

#[tokio::test]
async fn test_only_root_holds_the_root_grant() {
    let fixture = TestFixture::new().await;
    let mut uow = fixture.begin().await;

    let root_role = fixture
        .roles
        .get_role(uow.as_mut(), ROOT_ROLE)
        .await
        .unwrap();
    assert!(root_role.is_root());
    let members = fixture
        .roles
        .get_role(uow.as_mut(), "cssg_members")
        .await
        .unwrap();
    assert!(!members.is_root());

    let engine = PermissionEngine::new();
    let grants = engine.grants(uow.as_mut(), &fixture.root).await.unwrap();
    assert!(grants.has_root());
    for subject in [&fixture.ambassador, &fixture.leader, &fixture.member, &fixture.student] {
        let grants = engine.grants(uow.as_mut(), subject).await.unwrap();
        assert!(!grants.has_root());
    }
}
