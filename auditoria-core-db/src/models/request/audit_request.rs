use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::Identifiable;

/// Lifecycle status of an audit request. Terminal statuses are retained for
/// audit history, never hard-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_request_status", rename_all = "PascalCase")]
pub enum AuditRequestStatus {
    Requested,
    InReview,
    Quoted,
    MeetingRequested,
    Approved,
    Rejected,
    InProgress,
    Completed,
    Cancelled,
}

impl AuditRequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AuditRequestStatus::Completed
                | AuditRequestStatus::Rejected
                | AuditRequestStatus::Cancelled
        )
    }

    /// True once the request has passed the approval milestone.
    pub fn is_post_approval(&self) -> bool {
        matches!(
            self,
            AuditRequestStatus::Approved
                | AuditRequestStatus::InProgress
                | AuditRequestStatus::Completed
        )
    }
}

impl std::fmt::Display for AuditRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditRequestStatus::Requested => write!(f, "Requested"),
            AuditRequestStatus::InReview => write!(f, "InReview"),
            AuditRequestStatus::Quoted => write!(f, "Quoted"),
            AuditRequestStatus::MeetingRequested => write!(f, "MeetingRequested"),
            AuditRequestStatus::Approved => write!(f, "Approved"),
            AuditRequestStatus::Rejected => write!(f, "Rejected"),
            AuditRequestStatus::InProgress => write!(f, "InProgress"),
            AuditRequestStatus::Completed => write!(f, "Completed"),
            AuditRequestStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for AuditRequestStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Requested" => Ok(AuditRequestStatus::Requested),
            "InReview" => Ok(AuditRequestStatus::InReview),
            "Quoted" => Ok(AuditRequestStatus::Quoted),
            "MeetingRequested" => Ok(AuditRequestStatus::MeetingRequested),
            "Approved" => Ok(AuditRequestStatus::Approved),
            "Rejected" => Ok(AuditRequestStatus::Rejected),
            "InProgress" => Ok(AuditRequestStatus::InProgress),
            "Completed" => Ok(AuditRequestStatus::Completed),
            "Cancelled" => Ok(AuditRequestStatus::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_service_type", rename_all = "PascalCase")]
pub enum AuditServiceType {
    FinancialAudit,
    TaxCompliance,
    InternalControls,
    DueDiligence,
    /// Synthetic placeholder for administratively registered revenue.
    ManualIncome,
}

impl std::fmt::Display for AuditServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditServiceType::FinancialAudit => write!(f, "FinancialAudit"),
            AuditServiceType::TaxCompliance => write!(f, "TaxCompliance"),
            AuditServiceType::InternalControls => write!(f, "InternalControls"),
            AuditServiceType::DueDiligence => write!(f, "DueDiligence"),
            AuditServiceType::ManualIncome => write!(f, "ManualIncome"),
        }
    }
}

/// # Documentation
/// - One engagement request for a company, moving through the
///   quote/approve/execute lifecycle.
/// - `quoted_amount` is set if and only if the status has reached the Quoted
///   milestone; all quote mutations go through the workflow engine.
/// - At most one active commission may reference a given audit request.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditRequestModel {
    pub id: Uuid,
    pub company_id: Uuid,
    pub referring_partner_id: Option<Uuid>,
    pub service_type: AuditServiceType,
    pub fiscal_year: i32,
    pub urgent: bool,
    pub status: AuditRequestStatus,
    pub quoted_amount: Option<Decimal>,
    pub quote_notes: Option<String>,
    pub quote_valid_until: Option<DateTime<Utc>>,
    pub requested_at: DateTime<Utc>,
    pub quoted_at: Option<DateTime<Utc>>,
    /// Approval or rejection timestamp.
    pub decided_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Identifiable for AuditRequestModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
