//! Audit sink interface and the in-memory adapter.
//!
//! Every access decision and role mutation produces exactly one event
//! through [`AuditSink::record`]. The sink is append-only: no update or
//! delete operations exist anywhere in the system.

use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{QualdocError, QualdocResult};
use crate::models::audit::{AuditEvent, AuditEventKind, CreateAuditEvent};
use crate::repository::{PaginatedResult, Pagination};

/// Query filters for audit events.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub user_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub kind: Option<AuditEventKind>,
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
}

pub trait AuditSink: Send + Sync {
    /// Append a new audit event.
    fn record(
        &self,
        input: CreateAuditEvent,
    ) -> impl Future<Output = QualdocResult<AuditEvent>> + Send;

    fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> impl Future<Output = QualdocResult<PaginatedResult<AuditEvent>>> + Send;
}

impl<T: AuditSink> AuditSink for std::sync::Arc<T> {
    async fn record(&self, input: CreateAuditEvent) -> QualdocResult<AuditEvent> {
        (**self).record(input).await
    }

    async fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> QualdocResult<PaginatedResult<AuditEvent>> {
        (**self).list(filter, pagination).await
    }
}

/// In-memory audit sink, for tests and embedders without a database.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events in append order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    async fn record(&self, input: CreateAuditEvent) -> QualdocResult<AuditEvent> {
        let event = AuditEvent {
            id: Uuid::new_v4(),
            kind: input.kind,
            user_id: input.user_id,
            subject: input.subject,
            outcome: input.outcome,
            actor_id: input.actor_id,
            metadata: input
                .metadata
                .unwrap_or(serde_json::Value::Object(Default::default())),
            timestamp: Utc::now(),
        };

        let mut events = self
            .events
            .lock()
            .map_err(|_| QualdocError::Internal("audit sink poisoned".into()))?;
        events.push(event.clone());

        Ok(event)
    }

    async fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> QualdocResult<PaginatedResult<AuditEvent>> {
        let events = self
            .events
            .lock()
            .map_err(|_| QualdocError::Internal("audit sink poisoned".into()))?;

        let matching: Vec<AuditEvent> = events
            .iter()
            .filter(|e| filter.user_id.is_none_or(|id| e.user_id == id))
            .filter(|e| filter.actor_id.is_none_or(|id| e.actor_id == id))
            .filter(|e| filter.kind.is_none_or(|k| e.kind == k))
            .filter(|e| filter.from.is_none_or(|t| e.timestamp >= t))
            .filter(|e| filter.to.is_none_or(|t| e.timestamp <= t))
            .cloned()
            .collect();

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect();

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit::AuditOutcome;

    fn event_for(user_id: Uuid, kind: AuditEventKind) -> CreateAuditEvent {
        CreateAuditEvent {
            kind,
            user_id,
            subject: "final_approval".into(),
            outcome: AuditOutcome::Success,
            actor_id: user_id,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn record_appends_in_order() {
        let sink = MemoryAuditSink::new();
        let user = Uuid::new_v4();

        sink.record(event_for(user, AuditEventKind::AccessCheck))
            .await
            .unwrap();
        sink.record(event_for(user, AuditEventKind::RoleAssignment))
            .await
            .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, AuditEventKind::AccessCheck);
        assert_eq!(events[1].kind, AuditEventKind::RoleAssignment);
    }

    #[tokio::test]
    async fn list_filters_by_user_and_kind() {
        let sink = MemoryAuditSink::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        sink.record(event_for(alice, AuditEventKind::AccessCheck))
            .await
            .unwrap();
        sink.record(event_for(bob, AuditEventKind::AccessCheck))
            .await
            .unwrap();
        sink.record(event_for(alice, AuditEventKind::RoleRevoked))
            .await
            .unwrap();

        let result = sink
            .list(
                AuditFilter {
                    user_id: Some(alice),
                    kind: Some(AuditEventKind::AccessCheck),
                    ..Default::default()
                },
                Pagination::default(),
            )
            .await
            .unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].user_id, alice);
    }
}
