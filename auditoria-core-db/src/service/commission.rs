use auditoria_core_api::domain::{apply_percentage, Actor, ManualIncomeCommand};
use auditoria_core_api::error::{ApiError, ApiResult};
use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    AuditRequestModel, AuditRequestStatus, AuditServiceType, AuditTrailEntry, CommissionModel,
    CommissionStatus, TrailEntityType,
};
use crate::repository::{LedgerStore, LedgerTx};
use crate::service::boundary::{NotificationPayload, SettlementBoundary};

/// Result of a commission generation attempt.
#[derive(Debug, Clone)]
pub enum CommissionOutcome {
    /// The audit request has no referring partner or no quoted amount;
    /// approving a direct engagement is valid and owes nothing.
    NotApplicable,
    Created(CommissionModel),
    /// A commission already referenced this audit request; returned as-is
    /// instead of creating a duplicate.
    Existing(CommissionModel),
    /// Generation failed while the approval itself committed; bookkeeping is
    /// recoverable through the standalone reconciliation call.
    Deferred,
}

/// Creates the commission for an approved audit request inside an already
/// open transaction.
///
/// Snapshot semantics: the partner's rate is copied into the commission row
/// at this moment; later rate edits never retroactively change it. The
/// idempotency lookup and the counter accrual run in the same transaction as
/// the insert, so concurrent approvals of one request settle to exactly one
/// commission row.
pub async fn generate_commission_in_tx(
    tx: &mut dyn LedgerTx,
    request: &AuditRequestModel,
    now: DateTime<Utc>,
) -> ApiResult<CommissionOutcome> {
    let Some(partner_id) = request.referring_partner_id else {
        return Ok(CommissionOutcome::NotApplicable);
    };
    let Some(base_amount) = request.quoted_amount else {
        return Ok(CommissionOutcome::NotApplicable);
    };

    if let Some(existing) = tx.find_commission_by_audit_request(request.id).await? {
        return Ok(CommissionOutcome::Existing(existing));
    }

    let partner = tx
        .find_partner(partner_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("partner {partner_id}")))?;

    let rate_percent = partner.commission_rate;
    let amount = apply_percentage(base_amount, rate_percent);
    let commission = CommissionModel {
        id: Uuid::new_v4(),
        partner_id,
        audit_request_id: request.id,
        base_amount,
        rate_percent,
        amount,
        status: CommissionStatus::Pending,
        payment_reference: None,
        created_at: now,
        paid_at: None,
    };

    tx.create_commission(&commission).await?;
    tx.apply_commission_accrual(partner_id, amount).await?;

    Ok(CommissionOutcome::Created(commission))
}

/// Referral commission engine: accrual on approval, administrative entries
/// and payment settlement.
pub struct CommissionService<S> {
    store: Arc<S>,
    boundary: SettlementBoundary,
}

impl<S: LedgerStore> CommissionService<S> {
    pub fn new(store: Arc<S>, boundary: SettlementBoundary) -> Self {
        Self { store, boundary }
    }

    /// Standalone commission generation, used to reconcile approvals whose
    /// in-transaction generation was deferred.
    pub async fn generate_commission(
        &self,
        actor: Actor,
        audit_request_id: Uuid,
    ) -> ApiResult<CommissionOutcome> {
        let mut tx = self.store.begin().await?;
        let request = tx
            .find_audit_request(audit_request_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("audit request {audit_request_id}")))?;
        if !request.status.is_post_approval() {
            return Err(ApiError::invalid_state(
                "audit request",
                "generate_commission",
                request.status,
            ));
        }

        let outcome = generate_commission_in_tx(tx.as_mut(), &request, Utc::now()).await?;
        tx.commit().await?;

        if let CommissionOutcome::Created(commission) = &outcome {
            self.boundary
                .publish(
                    AuditTrailEntry::record(
                        actor,
                        "generate_commission",
                        TrailEntityType::Commission,
                        commission.id,
                        format!(
                            "commission of {} accrued for audit request {}",
                            commission.amount, audit_request_id
                        ),
                    ),
                    vec![NotificationPayload {
                        recipient_id: commission.partner_id,
                        subject: "Commission accrued".into(),
                        body: format!(
                            "A commission of {} ({}% of {}) is now pending.",
                            commission.amount, commission.rate_percent, commission.base_amount
                        ),
                        amount: Some(commission.amount),
                    }],
                )
                .await;
        }

        Ok(outcome)
    }

    /// Settles a pending commission. The payment reference is mandatory and
    /// permanent; only `pending_commissions` is decremented, lifetime totals
    /// stay as accrued.
    pub async fn mark_paid(
        &self,
        actor: Actor,
        commission_id: Uuid,
        payment_reference: &str,
    ) -> ApiResult<CommissionModel> {
        let reference = payment_reference.trim();
        if reference.is_empty() {
            return Err(ApiError::ValidationError(
                "payment reference must not be empty".into(),
            ));
        }
        let reference: HeaplessString<50> = HeaplessString::try_from(reference).map_err(|_| {
            ApiError::ValidationError("payment reference exceeds 50 characters".into())
        })?;

        let mut tx = self.store.begin().await?;
        let mut commission = tx
            .find_commission(commission_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("commission {commission_id}")))?;
        if commission.status != CommissionStatus::Pending {
            return Err(ApiError::invalid_state(
                "commission",
                "mark_paid",
                commission.status,
            ));
        }

        commission.status = CommissionStatus::Paid;
        commission.payment_reference = Some(reference);
        commission.paid_at = Some(Utc::now());
        tx.update_commission(&commission).await?;
        tx.apply_commission_settlement(commission.partner_id, commission.amount)
            .await?;
        tx.commit().await?;
        tracing::info!(
            commission_id = %commission.id,
            partner_id = %commission.partner_id,
            amount = %commission.amount,
            "commission settled"
        );

        self.boundary
            .publish(
                AuditTrailEntry::record(
                    actor,
                    "pay_commission",
                    TrailEntityType::Commission,
                    commission.id,
                    format!("status Pending -> Paid, reference {}", payment_reference),
                ),
                vec![NotificationPayload {
                    recipient_id: commission.partner_id,
                    subject: "Commission paid".into(),
                    body: format!(
                        "Your commission of {} was paid (reference {}).",
                        commission.amount, payment_reference
                    ),
                    amount: Some(commission.amount),
                }],
            )
            .await;

        Ok(commission)
    }

    /// Registers revenue earned outside the normal request flow: a synthetic,
    /// already-settled audit request plus a commission created through the
    /// exact same percentage/accrual path, keeping one source of truth for
    /// commission math.
    pub async fn record_manual_income(
        &self,
        actor: Actor,
        cmd: ManualIncomeCommand,
    ) -> ApiResult<(AuditRequestModel, CommissionModel)> {
        cmd.check()?;

        let mut tx = self.store.begin().await?;
        tx.find_partner(cmd.partner_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("partner {}", cmd.partner_id)))?;
        tx.find_company(cmd.company_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("company {}", cmd.company_id)))?;

        let now = Utc::now();
        let mut request = AuditRequestModel {
            id: Uuid::new_v4(),
            company_id: cmd.company_id,
            referring_partner_id: Some(cmd.partner_id),
            service_type: AuditServiceType::ManualIncome,
            fiscal_year: cmd.fiscal_year,
            urgent: false,
            status: AuditRequestStatus::Approved,
            quoted_amount: Some(cmd.base_amount),
            quote_notes: Some("Manually registered income".into()),
            quote_valid_until: None,
            requested_at: now,
            quoted_at: Some(now),
            decided_at: Some(now),
            started_at: None,
            finished_at: None,
        };
        tx.create_audit_request(&request).await?;

        let outcome = generate_commission_in_tx(tx.as_mut(), &request, now).await?;
        let CommissionOutcome::Created(commission) = outcome else {
            return Err(ApiError::InternalError(
                "manual income did not produce a commission".into(),
            ));
        };

        // The placeholder is settled immediately; it exists for bookkeeping,
        // not for the execution workflow.
        request.status = AuditRequestStatus::Completed;
        request.finished_at = Some(now);
        tx.update_audit_request(&request).await?;
        tx.commit().await?;

        self.boundary
            .publish(
                AuditTrailEntry::record(
                    actor,
                    "record_manual_income",
                    TrailEntityType::Commission,
                    commission.id,
                    format!(
                        "manual income of {} registered for partner {}",
                        cmd.base_amount, cmd.partner_id
                    ),
                ),
                vec![NotificationPayload {
                    recipient_id: commission.partner_id,
                    subject: "Commission accrued".into(),
                    body: format!(
                        "A commission of {} was registered from manual income of {}.",
                        commission.amount, commission.base_amount
                    ),
                    amount: Some(commission.amount),
                }],
            )
            .await;

        Ok((request, commission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryLedgerStore;
    use crate::test_utils::{create_test_company, create_test_partner};
    use rust_decimal_macros::dec;

    fn service(store: &MemoryLedgerStore) -> CommissionService<MemoryLedgerStore> {
        CommissionService::new(Arc::new(store.clone()), SettlementBoundary::disabled())
    }

    #[tokio::test]
    async fn mark_paid_requires_reference() {
        let store = MemoryLedgerStore::new();
        let svc = service(&store);
        let err = svc
            .mark_paid(Actor::admin(Uuid::new_v4()), Uuid::new_v4(), "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[tokio::test]
    async fn mark_paid_rejects_unknown_commission() {
        let store = MemoryLedgerStore::new();
        let svc = service(&store);
        let err = svc
            .mark_paid(Actor::admin(Uuid::new_v4()), Uuid::new_v4(), "TRF-001")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn manual_income_runs_through_standard_accrual() {
        let store = MemoryLedgerStore::new();
        let partner = create_test_partner(dec!(10), dec!(0));
        let company = create_test_company(Some(partner.id));
        {
            let mut tx = store.begin().await.unwrap();
            tx.create_partner(&partner).await.unwrap();
            tx.create_company(&company).await.unwrap();
            tx.commit().await.unwrap();
        }

        let svc = service(&store);
        let (request, commission) = svc
            .record_manual_income(
                Actor::admin(Uuid::new_v4()),
                ManualIncomeCommand {
                    partner_id: partner.id,
                    company_id: company.id,
                    base_amount: dec!(500.00),
                    fiscal_year: 2024,
                },
            )
            .await
            .unwrap();

        assert_eq!(request.status, AuditRequestStatus::Completed);
        assert_eq!(request.service_type, AuditServiceType::ManualIncome);
        assert_eq!(commission.amount, dec!(50.00));
        assert_eq!(commission.status, CommissionStatus::Pending);

        let mut tx = store.begin().await.unwrap();
        let stored = tx.find_partner(partner.id).await.unwrap().unwrap();
        assert_eq!(stored.total_commissions, dec!(50.00));
        assert_eq!(stored.pending_commissions, dec!(50.00));
    }

    #[tokio::test]
    async fn manual_income_requires_existing_company() {
        let store = MemoryLedgerStore::new();
        let partner = create_test_partner(dec!(10), dec!(0));
        {
            let mut tx = store.begin().await.unwrap();
            tx.create_partner(&partner).await.unwrap();
            tx.commit().await.unwrap();
        }

        let svc = service(&store);
        let err = svc
            .record_manual_income(
                Actor::admin(Uuid::new_v4()),
                ManualIncomeCommand {
                    partner_id: partner.id,
                    company_id: Uuid::new_v4(),
                    base_amount: dec!(500.00),
                    fiscal_year: 2024,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        // Nothing leaked from the aborted transaction.
        let mut tx = store.begin().await.unwrap();
        let stored = tx.find_partner(partner.id).await.unwrap().unwrap();
        assert_eq!(stored.total_commissions, dec!(0));
    }
}
