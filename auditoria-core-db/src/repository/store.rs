use async_trait::async_trait;
use auditoria_core_api::domain::HoursSplit;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{
    AuditRequestModel, CommissionModel, CompanyModel, ConsultationCategoryModel,
    ConsultationRequestModel, DocumentRequestModel, PartnerModel,
};

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;
pub type StoreResult<T> = Result<T, StoreError>;

/// Entry point into the durable store.
///
/// Every engine operation runs inside exactly one transaction obtained here.
/// Transactions against the same entity serialize through the store's
/// isolation; the engines rely on that for idempotency checks and counter
/// updates.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a transaction. Dropping the returned handle without calling
    /// `commit` rolls every write back.
    async fn begin(&self) -> StoreResult<Box<dyn LedgerTx>>;
}

/// One open transaction against the store.
///
/// The counter methods (`apply_commission_accrual`,
/// `apply_commission_settlement`, `deduct_hours_up_to`) are atomic
/// increments executed as a single statement against the current value.
/// They must never be implemented as a read followed by a separate write,
/// or concurrent settlements would lose updates.
#[async_trait]
pub trait LedgerTx: Send {
    // Audit requests
    async fn find_audit_request(&mut self, id: Uuid) -> StoreResult<Option<AuditRequestModel>>;
    async fn create_audit_request(&mut self, item: &AuditRequestModel) -> StoreResult<()>;
    async fn update_audit_request(&mut self, item: &AuditRequestModel) -> StoreResult<()>;

    // Document requests (external collaborator; the engine only needs the
    // open-count precondition and test seeding)
    async fn count_open_document_requests(&mut self, audit_request_id: Uuid) -> StoreResult<i64>;
    async fn create_document_request(&mut self, item: &DocumentRequestModel) -> StoreResult<()>;
    async fn update_document_request(&mut self, item: &DocumentRequestModel) -> StoreResult<()>;

    // Commissions
    async fn find_commission(&mut self, id: Uuid) -> StoreResult<Option<CommissionModel>>;

    /// Idempotency lookup for commission generation. Must run inside the
    /// same transaction as the subsequent insert to close the race window
    /// between concurrent approvals.
    async fn find_commission_by_audit_request(
        &mut self,
        audit_request_id: Uuid,
    ) -> StoreResult<Option<CommissionModel>>;
    async fn create_commission(&mut self, item: &CommissionModel) -> StoreResult<()>;
    async fn update_commission(&mut self, item: &CommissionModel) -> StoreResult<()>;

    // Partners and companies
    async fn find_partner(&mut self, id: Uuid) -> StoreResult<Option<PartnerModel>>;
    async fn create_partner(&mut self, item: &PartnerModel) -> StoreResult<()>;
    async fn update_partner(&mut self, item: &PartnerModel) -> StoreResult<()>;
    async fn find_company(&mut self, id: Uuid) -> StoreResult<Option<CompanyModel>>;
    async fn create_company(&mut self, item: &CompanyModel) -> StoreResult<()>;

    /// Atomically adds `amount` to both `total_commissions` and
    /// `pending_commissions` of the partner.
    async fn apply_commission_accrual(
        &mut self,
        partner_id: Uuid,
        amount: Decimal,
    ) -> StoreResult<()>;

    /// Atomically subtracts `amount` from `pending_commissions` only;
    /// lifetime accrual is untouched by payment.
    async fn apply_commission_settlement(
        &mut self,
        partner_id: Uuid,
        amount: Decimal,
    ) -> StoreResult<()>;

    /// Deducts up to `requested` hours from the partner's balance, capped at
    /// the available amount so the balance never goes negative through this
    /// path. Returns how much was deducted and the shortfall.
    async fn deduct_hours_up_to(
        &mut self,
        partner_id: Uuid,
        requested: Decimal,
    ) -> StoreResult<HoursSplit>;

    // Consultations
    async fn find_consultation(
        &mut self,
        id: Uuid,
    ) -> StoreResult<Option<ConsultationRequestModel>>;
    async fn create_consultation(&mut self, item: &ConsultationRequestModel) -> StoreResult<()>;
    async fn update_consultation(&mut self, item: &ConsultationRequestModel) -> StoreResult<()>;
    async fn find_consultation_category(
        &mut self,
        id: Uuid,
    ) -> StoreResult<Option<ConsultationCategoryModel>>;
    async fn create_consultation_category(
        &mut self,
        item: &ConsultationCategoryModel,
    ) -> StoreResult<()>;

    /// Makes every write of this transaction durable.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
