use async_trait::async_trait;
use auditoria_core_api::domain::{split_hours_deduction, HoursSplit};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::models::{
    AuditRequestModel, CommissionModel, CompanyModel, ConsultationCategoryModel,
    ConsultationRequestModel, DocumentRequestModel, Identifiable, PartnerModel,
};
use crate::repository::store::{LedgerStore, LedgerTx, StoreResult};

#[derive(Debug, Default, Clone)]
struct MemoryState {
    audit_requests: HashMap<Uuid, AuditRequestModel>,
    document_requests: HashMap<Uuid, DocumentRequestModel>,
    commissions: HashMap<Uuid, CommissionModel>,
    partners: HashMap<Uuid, PartnerModel>,
    companies: HashMap<Uuid, CompanyModel>,
    consultations: HashMap<Uuid, ConsultationRequestModel>,
    categories: HashMap<Uuid, ConsultationCategoryModel>,
}

/// In-memory ledger store with serialized transactions.
///
/// `begin` takes the state mutex for the lifetime of the transaction and
/// works on a cloned copy; `commit` swaps the copy back in, dropping the
/// handle discards it. That gives the same observable semantics the engines
/// rely on from the SQL store (full isolation, all-or-nothing writes) and
/// backs every engine test.
#[derive(Debug, Default, Clone)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> StoreResult<Box<dyn LedgerTx>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryLedgerTx { guard, working }))
    }
}

pub struct MemoryLedgerTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

fn missing(entity: &str, id: Uuid) -> Box<dyn std::error::Error + Send + Sync> {
    format!("{entity} {id} does not exist").into()
}

fn put<T: Identifiable + Clone>(map: &mut HashMap<Uuid, T>, item: &T) {
    map.insert(item.get_id(), item.clone());
}

fn replace<T: Identifiable + Clone>(
    map: &mut HashMap<Uuid, T>,
    entity: &'static str,
    item: &T,
) -> StoreResult<()> {
    match map.get_mut(&item.get_id()) {
        Some(slot) => {
            *slot = item.clone();
            Ok(())
        }
        None => Err(missing(entity, item.get_id())),
    }
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn find_audit_request(&mut self, id: Uuid) -> StoreResult<Option<AuditRequestModel>> {
        Ok(self.working.audit_requests.get(&id).cloned())
    }

    async fn create_audit_request(&mut self, item: &AuditRequestModel) -> StoreResult<()> {
        put(&mut self.working.audit_requests, item);
        Ok(())
    }

    async fn update_audit_request(&mut self, item: &AuditRequestModel) -> StoreResult<()> {
        replace(&mut self.working.audit_requests, "audit request", item)
    }

    async fn count_open_document_requests(&mut self, audit_request_id: Uuid) -> StoreResult<i64> {
        Ok(self
            .working
            .document_requests
            .values()
            .filter(|d| d.audit_request_id == audit_request_id && d.status.is_open())
            .count() as i64)
    }

    async fn create_document_request(&mut self, item: &DocumentRequestModel) -> StoreResult<()> {
        put(&mut self.working.document_requests, item);
        Ok(())
    }

    async fn update_document_request(&mut self, item: &DocumentRequestModel) -> StoreResult<()> {
        replace(&mut self.working.document_requests, "document request", item)
    }

    async fn find_commission(&mut self, id: Uuid) -> StoreResult<Option<CommissionModel>> {
        Ok(self.working.commissions.get(&id).cloned())
    }

    async fn find_commission_by_audit_request(
        &mut self,
        audit_request_id: Uuid,
    ) -> StoreResult<Option<CommissionModel>> {
        Ok(self
            .working
            .commissions
            .values()
            .find(|c| c.audit_request_id == audit_request_id)
            .cloned())
    }

    async fn create_commission(&mut self, item: &CommissionModel) -> StoreResult<()> {
        put(&mut self.working.commissions, item);
        Ok(())
    }

    async fn update_commission(&mut self, item: &CommissionModel) -> StoreResult<()> {
        replace(&mut self.working.commissions, "commission", item)
    }

    async fn find_partner(&mut self, id: Uuid) -> StoreResult<Option<PartnerModel>> {
        Ok(self.working.partners.get(&id).cloned())
    }

    async fn create_partner(&mut self, item: &PartnerModel) -> StoreResult<()> {
        put(&mut self.working.partners, item);
        Ok(())
    }

    async fn update_partner(&mut self, item: &PartnerModel) -> StoreResult<()> {
        replace(&mut self.working.partners, "partner", item)
    }

    async fn find_company(&mut self, id: Uuid) -> StoreResult<Option<CompanyModel>> {
        Ok(self.working.companies.get(&id).cloned())
    }

    async fn create_company(&mut self, item: &CompanyModel) -> StoreResult<()> {
        put(&mut self.working.companies, item);
        Ok(())
    }

    async fn apply_commission_accrual(
        &mut self,
        partner_id: Uuid,
        amount: Decimal,
    ) -> StoreResult<()> {
        let partner = self
            .working
            .partners
            .get_mut(&partner_id)
            .ok_or_else(|| missing("partner", partner_id))?;
        partner.total_commissions += amount;
        partner.pending_commissions += amount;
        Ok(())
    }

    async fn apply_commission_settlement(
        &mut self,
        partner_id: Uuid,
        amount: Decimal,
    ) -> StoreResult<()> {
        let partner = self
            .working
            .partners
            .get_mut(&partner_id)
            .ok_or_else(|| missing("partner", partner_id))?;
        partner.pending_commissions -= amount;
        Ok(())
    }

    async fn deduct_hours_up_to(
        &mut self,
        partner_id: Uuid,
        requested: Decimal,
    ) -> StoreResult<HoursSplit> {
        let partner = self
            .working
            .partners
            .get_mut(&partner_id)
            .ok_or_else(|| missing("partner", partner_id))?;
        let split = split_hours_deduction(partner.hours_balance, requested);
        partner.hours_balance -= split.deducted;
        Ok(split)
    }

    async fn find_consultation(
        &mut self,
        id: Uuid,
    ) -> StoreResult<Option<ConsultationRequestModel>> {
        Ok(self.working.consultations.get(&id).cloned())
    }

    async fn create_consultation(&mut self, item: &ConsultationRequestModel) -> StoreResult<()> {
        put(&mut self.working.consultations, item);
        Ok(())
    }

    async fn update_consultation(&mut self, item: &ConsultationRequestModel) -> StoreResult<()> {
        replace(&mut self.working.consultations, "consultation request", item)
    }

    async fn find_consultation_category(
        &mut self,
        id: Uuid,
    ) -> StoreResult<Option<ConsultationCategoryModel>> {
        Ok(self.working.categories.get(&id).cloned())
    }

    async fn create_consultation_category(
        &mut self,
        item: &ConsultationCategoryModel,
    ) -> StoreResult<()> {
        put(&mut self.working.categories, item);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryLedgerTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
