//! Integration tests for the Group repository using in-memory SurrealDB.

use qualdoc_core::error::QualdocError;
use qualdoc_core::models::group::{CreateGroup, MembershipInput, UpdateGroup};
use qualdoc_core::models::user::CreateUser;
use qualdoc_core::repository::{GroupRepository, Pagination, UserRepository};
use qualdoc_db::repository::{SurrealGroupRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB, run migrations, create one user.
async fn setup() -> (
    SurrealUserRepository<surrealdb::engine::local::Db>,
    SurrealGroupRepository<surrealdb::engine::local::Db>,
    Uuid, // user_id
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    qualdoc_db::run_migrations(&db).await.unwrap();

    let user_repo = SurrealUserRepository::new(db.clone());
    let user = user_repo
        .create(CreateUser {
            email: "alice@example.com".into(),
            full_name: "Alice Archer".into(),
            password: "correct-horse-battery".into(),
            is_superuser: false,
            approval_level: 2,
            individual_permissions: Vec::new(),
            metadata: None,
        })
        .await
        .unwrap();

    let group_repo = SurrealGroupRepository::new(db);
    (user_repo, group_repo, user.id)
}

fn quality_group() -> CreateGroup {
    CreateGroup {
        code: "quality_management".into(),
        name: "Quality Management".into(),
        description: "QM department".into(),
        group_permissions: vec!["final_approval".into(), "document_review".into()],
    }
}

fn membership() -> MembershipInput {
    MembershipInput {
        role_in_group: "member".into(),
        approval_level_in_group: 3,
        is_department_head: false,
    }
}

#[tokio::test]
async fn create_and_get_group() {
    let (_, repo, _) = setup().await;

    let group = repo.create(quality_group()).await.unwrap();
    assert_eq!(group.code, "quality_management");
    assert_eq!(group.name, "Quality Management");
    assert!(group.is_active);
    assert!(group.group_permissions.contains("final_approval"));

    let fetched = repo.get_by_id(group.id).await.unwrap();
    assert_eq!(fetched.id, group.id);

    let by_code = repo.get_by_code("quality_management").await.unwrap();
    assert_eq!(by_code.id, group.id);
}

#[tokio::test]
async fn duplicate_code_or_name_is_conflict() {
    let (_, repo, _) = setup().await;

    repo.create(quality_group()).await.unwrap();

    // Same code, different name.
    let err = repo
        .create(CreateGroup {
            name: "Another Name".into(),
            ..quality_group()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, QualdocError::Conflict { .. }));

    // Same name, different code.
    let err = repo
        .create(CreateGroup {
            code: "other_code".into(),
            ..quality_group()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, QualdocError::Conflict { .. }));
}

#[tokio::test]
async fn code_must_be_snake_case() {
    let (_, repo, _) = setup().await;

    for bad in ["Quality", "quality-management", "9starts_with_digit", ""] {
        let err = repo
            .create(CreateGroup {
                code: bad.into(),
                ..quality_group()
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err, QualdocError::Validation { .. }),
            "code {bad:?} should be rejected, got: {err:?}"
        );
    }
}

#[tokio::test]
async fn name_length_is_validated() {
    let (_, repo, _) = setup().await;

    let err = repo
        .create(CreateGroup {
            name: "Q".into(),
            ..quality_group()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, QualdocError::Validation { .. }));

    let err = repo
        .create(CreateGroup {
            name: "x".repeat(101),
            ..quality_group()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, QualdocError::Validation { .. }));
}

#[tokio::test]
async fn add_member_and_query_memberships() {
    let (_, repo, user_id) = setup().await;

    let group = repo.create(quality_group()).await.unwrap();
    let m = repo.add_member(user_id, group.id, membership()).await.unwrap();
    assert_eq!(m.user_id, user_id);
    assert_eq!(m.group_id, group.id);
    assert_eq!(m.role_in_group, "member");
    assert_eq!(m.approval_level_in_group, 3);

    assert!(repo.is_member(user_id, group.id).await.unwrap());

    let groups = repo.groups_for_user(user_id).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, group.id);

    let members = repo.members(group.id, Pagination::default()).await.unwrap();
    assert_eq!(members.total, 1);
    assert_eq!(members.items[0].id, user_id);
}

#[tokio::test]
async fn duplicate_membership_is_reasserted_not_rejected() {
    let (_, repo, user_id) = setup().await;

    let group = repo.create(quality_group()).await.unwrap();
    repo.add_member(user_id, group.id, membership()).await.unwrap();

    // Re-adding replaces the attributes instead of erroring.
    let reasserted = repo
        .add_member(
            user_id,
            group.id,
            MembershipInput {
                role_in_group: "lead".into(),
                approval_level_in_group: 5,
                is_department_head: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(reasserted.role_in_group, "lead");
    assert!(reasserted.is_department_head);

    // Still exactly one membership.
    let memberships = repo.memberships_for_user(user_id).await.unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].approval_level_in_group, 5);
}

#[tokio::test]
async fn add_member_validates_endpoints_and_level() {
    let (_, repo, user_id) = setup().await;
    let group = repo.create(quality_group()).await.unwrap();

    let err = repo
        .add_member(Uuid::new_v4(), group.id, membership())
        .await
        .unwrap_err();
    assert!(matches!(err, QualdocError::NotFound { .. }));

    let err = repo
        .add_member(user_id, Uuid::new_v4(), membership())
        .await
        .unwrap_err();
    assert!(matches!(err, QualdocError::NotFound { .. }));

    let err = repo
        .add_member(
            user_id,
            group.id,
            MembershipInput {
                approval_level_in_group: 9,
                ..membership()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QualdocError::Validation { .. }));
}

#[tokio::test]
async fn remove_member_is_idempotent() {
    let (_, repo, user_id) = setup().await;

    let group = repo.create(quality_group()).await.unwrap();
    repo.add_member(user_id, group.id, membership()).await.unwrap();

    repo.remove_member(user_id, group.id).await.unwrap();
    assert!(!repo.is_member(user_id, group.id).await.unwrap());

    // Removing again is not an error.
    repo.remove_member(user_id, group.id).await.unwrap();
}

#[tokio::test]
async fn soft_delete_deactivates_but_keeps_memberships() {
    let (_, repo, user_id) = setup().await;

    let group = repo.create(quality_group()).await.unwrap();
    repo.add_member(user_id, group.id, membership()).await.unwrap();

    repo.delete(group.id).await.unwrap();

    let fetched = repo.get_by_id(group.id).await.unwrap();
    assert!(!fetched.is_active);

    // Membership edge survives; the resolver filters inactive groups.
    assert!(repo.is_member(user_id, group.id).await.unwrap());
}

#[tokio::test]
async fn update_replaces_permission_set() {
    let (_, repo, _) = setup().await;

    let group = repo.create(quality_group()).await.unwrap();
    let updated = repo
        .update(
            group.id,
            UpdateGroup {
                group_permissions: Some(vec!["document_review".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.group_permissions.len(), 1);
    assert!(!updated.group_permissions.contains("final_approval"));
}
