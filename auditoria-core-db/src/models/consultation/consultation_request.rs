use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::Identifiable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "consultation_status", rename_all = "PascalCase")]
pub enum ConsultationStatus {
    Pending,
    /// "Cotizada" — an hours quote was issued and awaits partner acceptance.
    Quoted,
    Accepted,
    Rejected,
    InProgress,
    Completed,
    Cancelled,
}

impl ConsultationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConsultationStatus::Rejected
                | ConsultationStatus::Completed
                | ConsultationStatus::Cancelled
        )
    }
}

impl std::fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsultationStatus::Pending => write!(f, "Pending"),
            ConsultationStatus::Quoted => write!(f, "Quoted"),
            ConsultationStatus::Accepted => write!(f, "Accepted"),
            ConsultationStatus::Rejected => write!(f, "Rejected"),
            ConsultationStatus::InProgress => write!(f, "InProgress"),
            ConsultationStatus::Completed => write!(f, "Completed"),
            ConsultationStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for ConsultationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ConsultationStatus::Pending),
            "Quoted" => Ok(ConsultationStatus::Quoted),
            "Accepted" => Ok(ConsultationStatus::Accepted),
            "Rejected" => Ok(ConsultationStatus::Rejected),
            "InProgress" => Ok(ConsultationStatus::InProgress),
            "Completed" => Ok(ConsultationStatus::Completed),
            "Cancelled" => Ok(ConsultationStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// # Documentation
/// - Request for bounded advisory time from a partner, quoted in hours and
///   settled against the partner's prepaid balance.
/// - `assigned_hours` may be overwritten while Pending/Quoted; once Accepted
///   it is immutable and the deduction has already happened.
/// - Urgent requests skip explicit acceptance: quoting auto-accepts and
///   deducts in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConsultationRequestModel {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub urgent: bool,
    pub status: ConsultationStatus,
    pub category_id: Option<Uuid>,
    pub assigned_hours: Option<Decimal>,
    pub requested_at: DateTime<Utc>,
    pub quoted_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Identifiable for ConsultationRequestModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
