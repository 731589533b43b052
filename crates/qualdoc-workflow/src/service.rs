//! Document workflow service.
//!
//! Owns the document status lifecycle. Every transition validates
//! topology first (cheaper, and impossible transitions reveal nothing
//! about permissions), then asks the access decision service, then
//! commits the status flip and history append atomically.

use qualdoc_core::access::AccessDecision;
use qualdoc_core::error::{QualdocError, QualdocResult};
use qualdoc_core::models::document::{Document, DocumentStatus, StatusHistoryEntry};
use qualdoc_core::repository::DocumentRepository;
use tracing::info;
use uuid::Uuid;

use crate::transitions;

/// Read-only workflow projection for UI/API consumers.
///
/// `allowed_transitions` is a convenience intersection of the outgoing
/// edges with the acting user's effective permissions — it is not the
/// authorization boundary; [`WorkflowService::change_status`]
/// re-validates independently.
#[derive(Debug, Clone)]
pub struct WorkflowInfo {
    pub current_status: DocumentStatus,
    pub allowed_transitions: Vec<DocumentStatus>,
    pub history: Vec<StatusHistoryEntry>,
}

/// Document workflow state machine.
pub struct WorkflowService<D: DocumentRepository, X: AccessDecision> {
    documents: D,
    access: X,
}

impl<D: DocumentRepository, X: AccessDecision> WorkflowService<D, X> {
    pub fn new(documents: D, access: X) -> Self {
        Self { documents, access }
    }

    /// Apply a status transition to a document.
    ///
    /// Fails with `InvalidTransition` when the (current, new) pair is
    /// not in the transition table — including when a concurrent
    /// transition changed the status between the read and the commit —
    /// and with `Forbidden` when the acting user lacks every
    /// permission the transition accepts. Both failures leave the
    /// document and its history untouched.
    pub async fn change_status(
        &self,
        document_id: Uuid,
        new_status: DocumentStatus,
        acting_user: Uuid,
        comment: &str,
    ) -> QualdocResult<Document> {
        let document = self.documents.get_by_id(document_id).await?;
        let old_status = document.status;

        // 1. Topology first; permission alone never bypasses it.
        let Some(transition) = transitions::find(old_status, new_status) else {
            return Err(QualdocError::InvalidTransition {
                from: old_status,
                to: new_status,
            });
        };

        // 2. Any one of the transition's permissions grants. Each
        //    check is individually audited by the decision service.
        let mut granted = false;
        for permission in transition.required {
            if self.access.check_access(acting_user, permission).await? {
                granted = true;
                break;
            }
        }
        if !granted {
            return Err(QualdocError::Forbidden {
                reason: format!(
                    "transition {old_status} -> {new_status} requires one of {:?}",
                    transition.required
                ),
            });
        }

        // 3. Atomic compare-and-swap plus history append. A racing
        //    transition that committed first leaves our expected old
        //    status stale; report the actual pair.
        match self
            .documents
            .transition_status(document_id, old_status, new_status, acting_user, comment)
            .await
        {
            Ok(updated) => {
                info!(
                    %document_id,
                    from = %old_status,
                    to = %new_status,
                    by = %acting_user,
                    "document status changed"
                );
                Ok(updated)
            }
            Err(QualdocError::Conflict { .. }) => {
                let current = self.documents.get_by_id(document_id).await?;
                Err(QualdocError::InvalidTransition {
                    from: current.status,
                    to: new_status,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Current status, permitted next steps for the acting user, and
    /// the full transition history in chronological order.
    pub async fn workflow_info(
        &self,
        document_id: Uuid,
        acting_user: Uuid,
    ) -> QualdocResult<WorkflowInfo> {
        let document = self.documents.get_by_id(document_id).await?;
        let permissions = self.access.user_permissions(acting_user).await?;

        let allowed_transitions = transitions::outgoing(document.status)
            .filter(|t| t.required.iter().any(|code| permissions.contains(code)))
            .map(|t| t.to)
            .collect();

        let history = self.documents.history(document_id).await?;

        Ok(WorkflowInfo {
            current_status: document.status,
            allowed_transitions,
            history,
        })
    }
}
