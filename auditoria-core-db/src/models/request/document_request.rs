use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::Identifiable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_request_status", rename_all = "PascalCase")]
pub enum DocumentRequestStatus {
    Pending,
    Submitted,
    Resolved,
    Cancelled,
}

impl DocumentRequestStatus {
    /// Open document requests block completion of the owning audit request.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            DocumentRequestStatus::Pending | DocumentRequestStatus::Submitted
        )
    }
}

impl std::fmt::Display for DocumentRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentRequestStatus::Pending => write!(f, "Pending"),
            DocumentRequestStatus::Submitted => write!(f, "Submitted"),
            DocumentRequestStatus::Resolved => write!(f, "Resolved"),
            DocumentRequestStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Document tracking itself lives outside the core; the workflow engine only
/// checks the open-count precondition before completing an audit request.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentRequestModel {
    pub id: Uuid,
    pub audit_request_id: Uuid,
    pub title: String,
    pub status: DocumentRequestStatus,
    pub requested_at: DateTime<Utc>,
}

impl Identifiable for DocumentRequestModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
