//! Integration tests for the document workflow state machine, running
//! the full stack: SurrealDB repositories, the real access decision
//! service, and an in-memory audit sink.

use std::sync::Arc;

use qualdoc_access::AccessService;
use qualdoc_core::MemoryAuditSink;
use qualdoc_core::error::QualdocError;
use qualdoc_core::models::document::{CreateDocument, DocumentStatus};
use qualdoc_core::models::group::{CreateGroup, MembershipInput};
use qualdoc_core::models::permission::codes;
use qualdoc_core::models::user::CreateUser;
use qualdoc_core::repository::{DocumentRepository, GroupRepository, UserRepository};
use qualdoc_db::repository::{
    SurrealDocumentRepository, SurrealGroupRepository, SurrealRoleRepository,
    SurrealUserRepository,
};
use qualdoc_workflow::WorkflowService;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

use DocumentStatus::{Approved, Draft, Obsolete, Reviewed};

type Db = surrealdb::engine::local::Db;
type Access = AccessService<
    SurrealUserRepository<Db>,
    SurrealGroupRepository<Db>,
    SurrealRoleRepository<Db>,
    Arc<MemoryAuditSink>,
>;

struct Harness {
    workflow: WorkflowService<SurrealDocumentRepository<Db>, Access>,
    documents: SurrealDocumentRepository<Db>,
    users: SurrealUserRepository<Db>,
    groups: SurrealGroupRepository<Db>,
}

async fn setup() -> Harness {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    qualdoc_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let groups = SurrealGroupRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db.clone());
    let documents = SurrealDocumentRepository::new(db);
    let audit = Arc::new(MemoryAuditSink::new());

    let access = AccessService::new(users.clone(), groups.clone(), roles, audit);
    let workflow = WorkflowService::new(documents.clone(), access);

    Harness {
        workflow,
        documents,
        users,
        groups,
    }
}

impl Harness {
    async fn user_with(&self, email: &str, permissions: Vec<String>) -> Uuid {
        self.users
            .create(CreateUser {
                email: email.into(),
                full_name: "Test User".into(),
                password: "correct-horse-battery".into(),
                is_superuser: false,
                approval_level: 2,
                individual_permissions: permissions,
                metadata: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn superuser(&self, email: &str) -> Uuid {
        self.users
            .create(CreateUser {
                email: email.into(),
                full_name: "Root".into(),
                password: "correct-horse-battery".into(),
                is_superuser: true,
                approval_level: 5,
                individual_permissions: Vec::new(),
                metadata: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn draft(&self, creator: Uuid) -> Uuid {
        self.documents
            .create(CreateDocument {
                title: "SOP-001 Device Cleaning".into(),
                creator_id: creator,
                metadata: None,
            })
            .await
            .unwrap()
            .id
    }
}

#[tokio::test]
async fn full_lifecycle_draft_to_obsolete_and_back() {
    let h = setup().await;
    let author = h
        .user_with("author@example.com", vec![codes::SUBMIT_FOR_REVIEW.into()])
        .await;
    let approver = h
        .user_with("qm@example.com", vec![codes::FINAL_APPROVAL.into()])
        .await;
    let doc = h.draft(author).await;

    let d = h
        .workflow
        .change_status(doc, Reviewed, author, "ready")
        .await
        .unwrap();
    assert_eq!(d.status, Reviewed);

    let d = h
        .workflow
        .change_status(doc, Approved, approver, "approved")
        .await
        .unwrap();
    assert_eq!(d.status, Approved);

    let d = h
        .workflow
        .change_status(doc, Obsolete, approver, "superseded")
        .await
        .unwrap();
    assert_eq!(d.status, Obsolete);

    // Administrative reactivation back to draft.
    let d = h
        .workflow
        .change_status(doc, Draft, approver, "reactivated")
        .await
        .unwrap();
    assert_eq!(d.status, Draft);

    let history = h.documents.history(doc).await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[3].old_status, Obsolete);
    assert_eq!(history[3].new_status, Draft);
}

#[tokio::test]
async fn draft_to_approved_is_invalid_even_for_superuser() {
    let h = setup().await;
    let root = h.superuser("root@example.com").await;
    let doc = h.draft(root).await;

    let err = h
        .workflow
        .change_status(doc, Approved, root, "skip review")
        .await
        .unwrap_err();

    match err {
        QualdocError::InvalidTransition { from, to } => {
            assert_eq!(from, Draft);
            assert_eq!(to, Approved);
        }
        other => panic!("expected InvalidTransition, got {other:?}"),
    }

    // Nothing changed.
    let fetched = h.documents.get_by_id(doc).await.unwrap();
    assert_eq!(fetched.status, Draft);
    assert!(h.documents.history(doc).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_permission_is_forbidden_and_writes_nothing() {
    let h = setup().await;
    let author = h
        .user_with("author@example.com", vec![codes::SUBMIT_FOR_REVIEW.into()])
        .await;
    let doc = h.draft(author).await;

    h.workflow
        .change_status(doc, Reviewed, author, "ready")
        .await
        .unwrap();

    // The author lacks final_approval.
    let err = h
        .workflow
        .change_status(doc, Approved, author, "")
        .await
        .unwrap_err();
    assert!(
        matches!(err, QualdocError::Forbidden { .. }),
        "expected Forbidden, got: {err:?}"
    );

    let fetched = h.documents.get_by_id(doc).await.unwrap();
    assert_eq!(fetched.status, Reviewed);
    // Only the submit transition is on record.
    assert_eq!(h.documents.history(doc).await.unwrap().len(), 1);
}

#[tokio::test]
async fn rejection_accepts_the_reviewing_permission() {
    let h = setup().await;
    let author = h
        .user_with("author@example.com", vec![codes::SUBMIT_FOR_REVIEW.into()])
        .await;
    let reviewer = h
        .user_with("reviewer@example.com", vec![codes::DOCUMENT_REVIEW.into()])
        .await;
    let doc = h.draft(author).await;

    h.workflow
        .change_status(doc, Reviewed, author, "ready")
        .await
        .unwrap();

    // document_review (without final_approval) suffices for rejection.
    let d = h
        .workflow
        .change_status(doc, Draft, reviewer, "needs work")
        .await
        .unwrap();
    assert_eq!(d.status, Draft);

    // But it does not suffice for approval.
    h.workflow
        .change_status(doc, Reviewed, author, "fixed")
        .await
        .unwrap();
    let err = h
        .workflow
        .change_status(doc, Approved, reviewer, "")
        .await
        .unwrap_err();
    assert!(matches!(err, QualdocError::Forbidden { .. }));
}

#[tokio::test]
async fn group_inherited_permission_gates_transition() {
    let h = setup().await;
    let author = h
        .user_with("author@example.com", vec![codes::SUBMIT_FOR_REVIEW.into()])
        .await;
    // No individual permissions; final_approval comes from the group.
    let approver = h.user_with("qm@example.com", Vec::new()).await;
    let group = h
        .groups
        .create(CreateGroup {
            code: "quality_management".into(),
            name: "Quality Management".into(),
            description: String::new(),
            group_permissions: vec![codes::FINAL_APPROVAL.into()],
        })
        .await
        .unwrap();
    h.groups
        .add_member(
            approver,
            group.id,
            MembershipInput {
                role_in_group: "member".into(),
                approval_level_in_group: 4,
                is_department_head: false,
            },
        )
        .await
        .unwrap();

    let doc = h.draft(author).await;
    h.workflow
        .change_status(doc, Reviewed, author, "ready")
        .await
        .unwrap();

    let d = h
        .workflow
        .change_status(doc, Approved, approver, "approved")
        .await
        .unwrap();
    assert_eq!(d.status, Approved);
}

#[tokio::test]
async fn concurrent_transitions_one_wins_one_loses() {
    let h = setup().await;
    let author = h
        .user_with("author@example.com", vec![codes::SUBMIT_FOR_REVIEW.into()])
        .await;
    let doc = h.draft(author).await;

    // Two racing DRAFT -> REVIEWED transitions on the same document.
    let (r1, r2) = tokio::join!(
        h.workflow.change_status(doc, Reviewed, author, "first"),
        h.workflow.change_status(doc, Reviewed, author, "second"),
    );

    let results = [r1, r2];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one transition must win");

    let loser = results.iter().find(|r| r.is_err()).unwrap();
    assert!(
        matches!(
            loser.as_ref().unwrap_err(),
            QualdocError::InvalidTransition { .. }
        ),
        "loser must see InvalidTransition, got: {loser:?}"
    );

    // Exactly one history entry was appended.
    let history = h.documents.history(doc).await.unwrap();
    assert_eq!(history.len(), 1);

    let fetched = h.documents.get_by_id(doc).await.unwrap();
    assert_eq!(fetched.status, Reviewed);
}

#[tokio::test]
async fn workflow_info_intersects_permissions() {
    let h = setup().await;
    let author = h
        .user_with("author@example.com", vec![codes::SUBMIT_FOR_REVIEW.into()])
        .await;
    let approver = h
        .user_with("qm@example.com", vec![codes::FINAL_APPROVAL.into()])
        .await;
    let doc = h.draft(author).await;

    // From DRAFT the author can submit; the approver cannot.
    let info = h.workflow.workflow_info(doc, author).await.unwrap();
    assert_eq!(info.current_status, Draft);
    assert_eq!(info.allowed_transitions, vec![Reviewed]);
    assert!(info.history.is_empty());

    let info = h.workflow.workflow_info(doc, approver).await.unwrap();
    assert!(info.allowed_transitions.is_empty());

    // From REVIEWED the approver can approve or reject.
    h.workflow
        .change_status(doc, Reviewed, author, "ready")
        .await
        .unwrap();

    let info = h.workflow.workflow_info(doc, approver).await.unwrap();
    assert_eq!(info.current_status, Reviewed);
    let mut allowed = info.allowed_transitions.clone();
    allowed.sort_by_key(|s| s.as_str());
    assert_eq!(allowed, vec![Approved, Draft]);
    assert_eq!(info.history.len(), 1);

    // The author can no longer do anything from REVIEWED.
    let info = h.workflow.workflow_info(doc, author).await.unwrap();
    assert!(info.allowed_transitions.is_empty());
}

#[tokio::test]
async fn unknown_document_is_not_found() {
    let h = setup().await;
    let root = h.superuser("root@example.com").await;

    let err = h
        .workflow
        .change_status(Uuid::new_v4(), Reviewed, root, "")
        .await
        .unwrap_err();
    assert!(matches!(err, QualdocError::NotFound { .. }));

    let err = h
        .workflow
        .workflow_info(Uuid::new_v4(), root)
        .await
        .unwrap_err();
    assert!(matches!(err, QualdocError::NotFound { .. }));
}

#[tokio::test]
async fn version_counts_committed_transitions() {
    let h = setup().await;
    let root = h.superuser("root@example.com").await;
    let doc = h.draft(root).await;

    h.workflow
        .change_status(doc, Reviewed, root, "")
        .await
        .unwrap();
    let d = h
        .workflow
        .change_status(doc, Approved, root, "")
        .await
        .unwrap();

    // Starts at 1, bumped once per committed transition.
    assert_eq!(d.version, 3);
}
