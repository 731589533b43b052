//! SurrealDB implementation of [`DocumentRepository`].
//!
//! The status transition is the one write in the system that needs a
//! mutual-exclusion discipline: the status compare-and-swap and the
//! history append run inside a single transaction, so a racing
//! transition either wins both writes or neither.

use chrono::{DateTime, Utc};
use qualdoc_core::error::QualdocResult;
use qualdoc_core::models::document::{
    CreateDocument, Document, DocumentStatus, StatusHistoryEntry,
};
use qualdoc_core::repository::{DocumentRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Marker THROWn inside the transition transaction when the CAS
/// misses; detected on the error path to report a stale status.
const STALE_STATUS_MARKER: &str = "qualdoc:stale-status";

#[derive(Debug, SurrealValue)]
struct DocumentRow {
    title: String,
    status: String,
    creator_id: String,
    version: u32,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct DocumentRowWithId {
    record_id: String,
    title: String,
    status: String,
    creator_id: String,
    version: u32,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct HistoryRow {
    record_id: String,
    document_id: String,
    old_status: String,
    new_status: String,
    changed_by: String,
    comment: String,
    timestamp: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<DocumentStatus, DbError> {
    match s {
        "DRAFT" => Ok(DocumentStatus::Draft),
        "REVIEWED" => Ok(DocumentStatus::Reviewed),
        "APPROVED" => Ok(DocumentStatus::Approved),
        "OBSOLETE" => Ok(DocumentStatus::Obsolete),
        other => Err(DbError::Migration(format!(
            "unknown document status: {other}"
        ))),
    }
}

impl DocumentRow {
    fn into_document(self, id: Uuid) -> Result<Document, DbError> {
        let creator_id = Uuid::parse_str(&self.creator_id)
            .map_err(|e| DbError::Migration(format!("invalid creator UUID: {e}")))?;
        Ok(Document {
            id,
            title: self.title,
            status: parse_status(&self.status)?,
            creator_id,
            version: self.version,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl DocumentRowWithId {
    fn try_into_document(self) -> Result<Document, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let creator_id = Uuid::parse_str(&self.creator_id)
            .map_err(|e| DbError::Migration(format!("invalid creator UUID: {e}")))?;
        Ok(Document {
            id,
            title: self.title,
            status: parse_status(&self.status)?,
            creator_id,
            version: self.version,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl HistoryRow {
    fn try_into_entry(self) -> Result<StatusHistoryEntry, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let document_id = Uuid::parse_str(&self.document_id)
            .map_err(|e| DbError::Migration(format!("invalid document UUID: {e}")))?;
        let changed_by = Uuid::parse_str(&self.changed_by)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        Ok(StatusHistoryEntry {
            id,
            document_id,
            old_status: parse_status(&self.old_status)?,
            new_status: parse_status(&self.new_status)?,
            changed_by,
            comment: self.comment,
            timestamp: self.timestamp,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Document repository.
#[derive(Clone)]
pub struct SurrealDocumentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDocumentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DocumentRepository for SurrealDocumentRepository<C> {
    async fn create(&self, input: CreateDocument) -> QualdocResult<Document> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('document', $id) SET \
                 title = $title, status = 'DRAFT', \
                 creator_id = $creator_id, version = 1, \
                 metadata = $metadata",
            )
            .bind(("id", id_str.clone()))
            .bind(("title", input.title))
            .bind(("creator_id", input.creator_id.to_string()))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<DocumentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "document".into(),
            id: id_str,
        })?;

        Ok(row.into_document(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> QualdocResult<Document> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('document', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "document".into(),
            id: id_str,
        })?;

        Ok(row.into_document(id)?)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: DocumentStatus,
        to: DocumentStatus,
        changed_by: Uuid,
        comment: &str,
    ) -> QualdocResult<Document> {
        let id_str = id.to_string();
        let history_id = Uuid::new_v4().to_string();

        // Compare-and-swap on status plus the history append, inside
        // one transaction. A missed CAS throws, rolling back both
        // writes; exactly one of two racing transitions commits.
        let query = format!(
            "BEGIN TRANSACTION; \
             LET $updated = (UPDATE type::record('document', $id) SET \
                 status = $to, version = version + 1, \
                 updated_at = time::now() \
                 WHERE status = $from RETURN AFTER); \
             IF array::len($updated) == 0 {{ THROW '{STALE_STATUS_MARKER}' }}; \
             CREATE type::record('status_history', $history_id) SET \
                 document_id = $id, old_status = $from, \
                 new_status = $to, changed_by = $changed_by, \
                 comment = $comment; \
             COMMIT TRANSACTION;"
        );

        let response = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("from", from.as_str()))
            .bind(("to", to.as_str()))
            .bind(("history_id", history_id))
            .bind(("changed_by", changed_by.to_string()))
            .bind(("comment", comment.to_string()))
            .await;

        // The THROW may surface either on the query itself or on the
        // per-statement results; inspect both paths.
        let outcome = match response {
            Ok(result) => result.check().map(|_| ()).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        if let Err(message) = outcome {
            if message.contains(STALE_STATUS_MARKER) {
                return Err(DbError::Stale {
                    id: id_str,
                    expected: from.as_str().to_string(),
                }
                .into());
            }
            return Err(DbError::Migration(message).into());
        }

        self.get_by_id(id).await
    }

    async fn history(&self, document_id: Uuid) -> QualdocResult<Vec<StatusHistoryEntry>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM status_history \
                 WHERE document_id = $document_id \
                 ORDER BY timestamp ASC",
            )
            .bind(("document_id", document_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<HistoryRow> = result.take(0).map_err(DbError::from)?;

        let entries = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(entries)
    }

    async fn list(&self, pagination: Pagination) -> QualdocResult<PaginatedResult<Document>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM document GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM document \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_document())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
