//! SurrealDB implementation of [`AuditSink`].
//!
//! The `audit_event` table is append-only at the permission level;
//! this adapter only ever creates and selects.

use chrono::{DateTime, Utc};
use qualdoc_core::audit::{AuditFilter, AuditSink};
use qualdoc_core::error::QualdocResult;
use qualdoc_core::models::audit::{AuditEvent, AuditEventKind, AuditOutcome, CreateAuditEvent};
use qualdoc_core::repository::{PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AuditRow {
    record_id: String,
    kind: String,
    user_id: String,
    subject: String,
    outcome: String,
    actor_id: String,
    metadata: serde_json::Value,
    timestamp: DateTime<Utc>,
}

fn parse_kind(s: &str) -> Result<AuditEventKind, DbError> {
    match s {
        "access_check" => Ok(AuditEventKind::AccessCheck),
        "role_assignment" => Ok(AuditEventKind::RoleAssignment),
        "role_revoked" => Ok(AuditEventKind::RoleRevoked),
        other => Err(DbError::Migration(format!("unknown audit kind: {other}"))),
    }
}

fn parse_outcome(s: &str) -> Result<AuditOutcome, DbError> {
    match s {
        "Success" => Ok(AuditOutcome::Success),
        "Failure" => Ok(AuditOutcome::Failure),
        "Denied" => Ok(AuditOutcome::Denied),
        other => Err(DbError::Migration(format!("unknown outcome: {other}"))),
    }
}

fn outcome_to_string(outcome: AuditOutcome) -> &'static str {
    match outcome {
        AuditOutcome::Success => "Success",
        AuditOutcome::Failure => "Failure",
        AuditOutcome::Denied => "Denied",
    }
}

impl AuditRow {
    fn try_into_event(self) -> Result<AuditEvent, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        let actor_id = Uuid::parse_str(&self.actor_id)
            .map_err(|e| DbError::Migration(format!("invalid actor UUID: {e}")))?;
        Ok(AuditEvent {
            id,
            kind: parse_kind(&self.kind)?,
            user_id,
            subject: self.subject,
            outcome: parse_outcome(&self.outcome)?,
            actor_id,
            metadata: self.metadata,
            timestamp: self.timestamp,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the audit sink.
#[derive(Clone)]
pub struct SurrealAuditSink<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditSink<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuditSink for SurrealAuditSink<C> {
    async fn record(&self, input: CreateAuditEvent) -> QualdocResult<AuditEvent> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('audit_event', $id) SET \
                 kind = $kind, user_id = $user_id, \
                 subject = $subject, outcome = $outcome, \
                 actor_id = $actor_id, metadata = $metadata",
            )
            .bind(("id", id_str.clone()))
            .bind(("kind", input.kind.as_str()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("subject", input.subject))
            .bind(("outcome", outcome_to_string(input.outcome)))
            .bind(("actor_id", input.actor_id.to_string()))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        // Read the event back with the record id projected.
        let mut readback = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('audit_event', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AuditRow> = readback.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "audit_event".into(),
            id: id_str,
        })?;

        Ok(row.try_into_event()?)
    }

    async fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> QualdocResult<PaginatedResult<AuditEvent>> {
        let mut conditions = Vec::new();
        if filter.user_id.is_some() {
            conditions.push("user_id = $user_id");
        }
        if filter.actor_id.is_some() {
            conditions.push("actor_id = $actor_id");
        }
        if filter.kind.is_some() {
            conditions.push("kind = $kind");
        }
        if filter.from.is_some() {
            conditions.push("timestamp >= $from");
        }
        if filter.to.is_some() {
            conditions.push("timestamp <= $to");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", conditions.join(" AND "))
        };

        let count_query = format!(
            "SELECT count() AS total FROM audit_event {where_clause}GROUP ALL"
        );
        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM audit_event \
             {where_clause}ORDER BY timestamp ASC \
             LIMIT $limit START $offset"
        );

        fn bind_filters<'a, C: Connection>(
            mut builder: surrealdb::method::Query<'a, C>,
            filter: &AuditFilter,
        ) -> surrealdb::method::Query<'a, C> {
            if let Some(user_id) = filter.user_id {
                builder = builder.bind(("user_id", user_id.to_string()));
            }
            if let Some(actor_id) = filter.actor_id {
                builder = builder.bind(("actor_id", actor_id.to_string()));
            }
            if let Some(kind) = filter.kind {
                builder = builder.bind(("kind", kind.as_str()));
            }
            if let Some(from) = filter.from {
                builder = builder.bind(("from", from));
            }
            if let Some(to) = filter.to {
                builder = builder.bind(("to", to));
            }
            builder
        }

        let mut count_result = bind_filters(self.db.query(&count_query), &filter)
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = bind_filters(self.db.query(&list_query), &filter)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_event())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
