//! Integration tests for the permission catalog and role repositories.

use qualdoc_core::error::QualdocError;
use qualdoc_core::models::permission::{CreatePermission, CreateRole, codes};
use qualdoc_core::repository::{Pagination, PermissionRepository, RoleRepository};
use qualdoc_db::repository::{SurrealPermissionRepository, SurrealRoleRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

async fn setup() -> (
    SurrealPermissionRepository<surrealdb::engine::local::Db>,
    SurrealRoleRepository<surrealdb::engine::local::Db>,
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    qualdoc_db::run_migrations(&db).await.unwrap();

    (
        SurrealPermissionRepository::new(db.clone()),
        SurrealRoleRepository::new(db),
    )
}

#[tokio::test]
async fn create_and_get_permission() {
    let (permissions, _) = setup().await;

    let created = permissions
        .create(CreatePermission {
            code: codes::FINAL_APPROVAL.into(),
            description: "Approve documents".into(),
        })
        .await
        .unwrap();
    assert_eq!(created.code, codes::FINAL_APPROVAL);

    let fetched = permissions.get_by_code(codes::FINAL_APPROVAL).await.unwrap();
    assert_eq!(fetched.id, created.id);
}

#[tokio::test]
async fn duplicate_permission_code_is_conflict() {
    let (permissions, _) = setup().await;

    permissions
        .create(CreatePermission {
            code: codes::FINAL_APPROVAL.into(),
            description: "Approve documents".into(),
        })
        .await
        .unwrap();

    let err = permissions
        .create(CreatePermission {
            code: codes::FINAL_APPROVAL.into(),
            description: "Different description".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, QualdocError::Conflict { .. }));
}

#[tokio::test]
async fn seed_whole_catalog() {
    let (permissions, _) = setup().await;

    for (code, description) in codes::ALL {
        permissions
            .create(CreatePermission {
                code: (*code).into(),
                description: (*description).into(),
            })
            .await
            .unwrap();
    }

    let listed = permissions.list(Pagination::default()).await.unwrap();
    assert_eq!(listed.total, codes::ALL.len() as u64);
}

#[tokio::test]
async fn create_and_get_role() {
    let (_, roles) = setup().await;

    let role = roles
        .create(CreateRole {
            name: "quality_manager".into(),
            description: "Quality management lead".into(),
            permissions: vec![
                codes::FINAL_APPROVAL.into(),
                codes::DOCUMENT_REVIEW.into(),
            ],
        })
        .await
        .unwrap();

    assert_eq!(role.permissions.len(), 2);

    let fetched = roles.get_by_name("quality_manager").await.unwrap();
    assert_eq!(fetched.id, role.id);
    assert!(fetched.permissions.contains(codes::FINAL_APPROVAL));
}

#[tokio::test]
async fn duplicate_role_name_is_conflict() {
    let (_, roles) = setup().await;

    roles
        .create(CreateRole {
            name: "reviewer".into(),
            description: String::new(),
            permissions: vec![codes::DOCUMENT_REVIEW.into()],
        })
        .await
        .unwrap();

    let err = roles
        .create(CreateRole {
            name: "reviewer".into(),
            description: String::new(),
            permissions: Vec::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, QualdocError::Conflict { .. }));
}

#[tokio::test]
async fn missing_role_is_not_found() {
    let (_, roles) = setup().await;

    let err = roles.get_by_name("nonexistent").await.unwrap_err();
    assert!(matches!(err, QualdocError::NotFound { .. }));
}
