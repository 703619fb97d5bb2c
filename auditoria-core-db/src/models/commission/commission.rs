use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::Identifiable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "commission_status", rename_all = "PascalCase")]
pub enum CommissionStatus {
    Pending,
    Paid,
}

impl std::fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommissionStatus::Pending => write!(f, "Pending"),
            CommissionStatus::Paid => write!(f, "Paid"),
        }
    }
}

impl FromStr for CommissionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(CommissionStatus::Pending),
            "Paid" => Ok(CommissionStatus::Paid),
            _ => Err(()),
        }
    }
}

/// # Documentation
/// - Financial entitlement owed to a referring partner for one audit request.
/// - `base_amount` and `rate_percent` are value copies taken at generation
///   time; later rate edits on the partner never alter an existing commission.
/// - `amount` = base × rate / 100 at the currency's minor unit, computed once.
/// - Exactly one commission per audit request; Pending → Paid only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionModel {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub audit_request_id: Uuid,
    pub base_amount: Decimal,
    pub rate_percent: Decimal,
    pub amount: Decimal,
    pub status: CommissionStatus,
    /// Required and permanent once the commission is paid.
    pub payment_reference: Option<HeaplessString<50>>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Identifiable for CommissionModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
