use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Identifiable;

/// # Documentation
/// - Referral account owning companies, audit requests, commissions and an
///   advisory-hours balance.
/// - `pending_commissions` mirrors the sum of this partner's Pending
///   commission amounts and is maintained by atomic increments inside the
///   same transaction as the commission write, never recomputed lazily.
/// - `total_commissions` is lifetime accrual; paying a commission leaves it
///   untouched.
/// - `commission_rate` is mutable; commissions snapshot it at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerModel {
    pub id: Uuid,
    pub name: HeaplessString<100>,
    /// Percentage applied to newly generated commissions.
    pub commission_rate: Decimal,
    pub total_commissions: Decimal,
    pub pending_commissions: Decimal,
    /// Pre-purchased advisory hours. The urgent-consultation deduction path
    /// floors at zero; administrative adjustments outside this core may not.
    pub hours_balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Identifiable for PartnerModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
