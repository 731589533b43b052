//! Document and status history domain models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a controlled document.
///
/// Statuses change only through the workflow engine's validated
/// transitions, never by direct field assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentStatus {
    Draft,
    Reviewed,
    Approved,
    Obsolete,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Reviewed => "REVIEWED",
            Self::Approved => "APPROVED",
            Self::Obsolete => "OBSOLETE",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub status: DocumentStatus,
    pub creator_id: Uuid,
    /// Revision counter, bumped by every committed transition.
    pub version: u32,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocument {
    pub title: String,
    pub creator_id: Uuid,
    pub metadata: Option<serde_json::Value>,
}

/// Append-only record of one committed status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub document_id: Uuid,
    pub old_status: DocumentStatus,
    pub new_status: DocumentStatus,
    pub changed_by: Uuid,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
}
