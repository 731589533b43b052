//! Integration tests for the Document repository using in-memory SurrealDB.

use qualdoc_core::error::QualdocError;
use qualdoc_core::models::document::{CreateDocument, DocumentStatus};
use qualdoc_core::repository::{DocumentRepository, Pagination};
use qualdoc_db::repository::SurrealDocumentRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> (SurrealDocumentRepository<surrealdb::engine::local::Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    qualdoc_db::run_migrations(&db).await.unwrap();

    (SurrealDocumentRepository::new(db), Uuid::new_v4())
}

fn sop(creator_id: Uuid) -> CreateDocument {
    CreateDocument {
        title: "SOP-001 Device Cleaning".into(),
        creator_id,
        metadata: None,
    }
}

#[tokio::test]
async fn new_documents_start_in_draft() {
    let (repo, creator) = setup().await;

    let doc = repo.create(sop(creator)).await.unwrap();
    assert_eq!(doc.status, DocumentStatus::Draft);
    assert_eq!(doc.version, 1);
    assert_eq!(doc.creator_id, creator);

    let fetched = repo.get_by_id(doc.id).await.unwrap();
    assert_eq!(fetched.status, DocumentStatus::Draft);
}

#[tokio::test]
async fn transition_updates_status_and_appends_history() {
    let (repo, creator) = setup().await;
    let doc = repo.create(sop(creator)).await.unwrap();

    let updated = repo
        .transition_status(
            doc.id,
            DocumentStatus::Draft,
            DocumentStatus::Reviewed,
            creator,
            "ready for review",
        )
        .await
        .unwrap();

    assert_eq!(updated.status, DocumentStatus::Reviewed);
    assert_eq!(updated.version, 2);

    let history = repo.history(doc.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_status, DocumentStatus::Draft);
    assert_eq!(history[0].new_status, DocumentStatus::Reviewed);
    assert_eq!(history[0].changed_by, creator);
    assert_eq!(history[0].comment, "ready for review");
}

#[tokio::test]
async fn stale_cas_is_conflict_and_writes_nothing() {
    let (repo, creator) = setup().await;
    let doc = repo.create(sop(creator)).await.unwrap();

    // The document is in DRAFT; expecting REVIEWED misses the CAS.
    let err = repo
        .transition_status(
            doc.id,
            DocumentStatus::Reviewed,
            DocumentStatus::Approved,
            creator,
            "",
        )
        .await
        .unwrap_err();

    assert!(
        matches!(err, QualdocError::Conflict { .. }),
        "expected Conflict, got: {err:?}"
    );

    // Neither write landed.
    let fetched = repo.get_by_id(doc.id).await.unwrap();
    assert_eq!(fetched.status, DocumentStatus::Draft);
    assert_eq!(fetched.version, 1);
    assert!(repo.history(doc.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn history_is_chronological() {
    let (repo, creator) = setup().await;
    let doc = repo.create(sop(creator)).await.unwrap();

    repo.transition_status(
        doc.id,
        DocumentStatus::Draft,
        DocumentStatus::Reviewed,
        creator,
        "submit",
    )
    .await
    .unwrap();
    repo.transition_status(
        doc.id,
        DocumentStatus::Reviewed,
        DocumentStatus::Draft,
        creator,
        "rejected",
    )
    .await
    .unwrap();
    repo.transition_status(
        doc.id,
        DocumentStatus::Draft,
        DocumentStatus::Reviewed,
        creator,
        "resubmit",
    )
    .await
    .unwrap();

    let history = repo.history(doc.id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].comment, "submit");
    assert_eq!(history[1].comment, "rejected");
    assert_eq!(history[2].comment, "resubmit");
    for window in history.windows(2) {
        assert!(window[0].timestamp <= window[1].timestamp);
    }
}

#[tokio::test]
async fn list_documents() {
    let (repo, creator) = setup().await;
    repo.create(sop(creator)).await.unwrap();
    repo.create(CreateDocument {
        title: "SOP-002 Calibration".into(),
        creator_id: creator,
        metadata: None,
    })
    .await
    .unwrap();

    let listed = repo.list(Pagination::default()).await.unwrap();
    assert_eq!(listed.total, 2);
    assert_eq!(listed.items.len(), 2);
}
