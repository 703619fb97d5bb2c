//! Commission accrual and settlement invariants: idempotent generation,
//! snapshot rates, and partner counters that always match the commission rows.

use async_trait::async_trait;
use auditoria_core_api::domain::{Actor, QuoteCommand};
use auditoria_core_api::error::ApiError;
use auditoria_core_db::models::{AuditRequestStatus, AuditTrailEntry, CommissionStatus};
use auditoria_core_db::repository::{LedgerStore, LedgerTx, MemoryLedgerStore, StoreResult};
use auditoria_core_db::service::{
    AuditTrailPort, AuditWorkflowService, CommissionOutcome, CommissionService,
    NotificationPayload, NotificationPort, SettlementBoundary,
};
use auditoria_core_db::test_utils::{
    create_test_audit_request, create_test_company, create_test_partner,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

fn quote(amount: Decimal) -> QuoteCommand {
    QuoteCommand {
        amount,
        notes: None,
        validity_days: 30,
    }
}

struct Fixture {
    store: MemoryLedgerStore,
    workflow: AuditWorkflowService<MemoryLedgerStore>,
    commissions: CommissionService<MemoryLedgerStore>,
    partner_id: Uuid,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_boundary(SettlementBoundary::disabled()).await
    }

    async fn with_boundary(boundary: SettlementBoundary) -> Self {
        let store = MemoryLedgerStore::new();
        let partner = create_test_partner(dec!(15), dec!(0));
        let partner_id = partner.id;
        let company = create_test_company(Some(partner_id));
        let mut tx = store.begin().await.unwrap();
        tx.create_partner(&partner).await.unwrap();
        tx.create_company(&company).await.unwrap();
        tx.commit().await.unwrap();

        let arc = Arc::new(store.clone());
        Self {
            workflow: AuditWorkflowService::new(Arc::clone(&arc), boundary.clone()),
            commissions: CommissionService::new(arc, boundary),
            store,
            partner_id,
        }
    }

    async fn seed_quoted_request(&self, amount: Decimal) -> Uuid {
        let mut tx = self.store.begin().await.unwrap();
        let company_id = Uuid::new_v4();
        let request = create_test_audit_request(
            company_id,
            Some(self.partner_id),
            AuditRequestStatus::Requested,
        );
        let id = request.id;
        tx.create_audit_request(&request).await.unwrap();
        tx.commit().await.unwrap();

        self.workflow
            .submit_quote(Actor::auditor(Uuid::new_v4()), id, quote(amount))
            .await
            .unwrap();
        id
    }

    async fn partner_counters(&self) -> (Decimal, Decimal) {
        let mut tx = self.store.begin().await.unwrap();
        let partner = tx.find_partner(self.partner_id).await.unwrap().unwrap();
        (partner.total_commissions, partner.pending_commissions)
    }
}

#[tokio::test]
async fn approval_accrues_commission_at_snapshot_rate() {
    // Scenario: quoted at 1000.00, partner rate 15%.
    let fx = Fixture::new().await;
    let request_id = fx.seed_quoted_request(dec!(1000.00)).await;

    let outcome = fx
        .workflow
        .approve(Actor::company(Uuid::new_v4()), request_id)
        .await
        .unwrap();

    assert_eq!(outcome.request.status, AuditRequestStatus::Approved);
    assert!(outcome.request.decided_at.is_some());
    let CommissionOutcome::Created(commission) = outcome.commission else {
        panic!("expected a created commission");
    };
    assert_eq!(commission.base_amount, dec!(1000.00));
    assert_eq!(commission.rate_percent, dec!(15));
    assert_eq!(commission.amount, dec!(150.00));
    assert_eq!(commission.status, CommissionStatus::Pending);

    assert_eq!(fx.partner_counters().await, (dec!(150.00), dec!(150.00)));
}

#[tokio::test]
async fn paying_commission_settles_pending_only() {
    let fx = Fixture::new().await;
    let request_id = fx.seed_quoted_request(dec!(1000.00)).await;
    let outcome = fx
        .workflow
        .approve(Actor::company(Uuid::new_v4()), request_id)
        .await
        .unwrap();
    let CommissionOutcome::Created(commission) = outcome.commission else {
        panic!("expected a created commission");
    };

    let paid = fx
        .commissions
        .mark_paid(Actor::admin(Uuid::new_v4()), commission.id, "TRF-001")
        .await
        .unwrap();

    assert_eq!(paid.status, CommissionStatus::Paid);
    assert_eq!(paid.payment_reference.as_ref().unwrap().as_str(), "TRF-001");
    assert!(paid.paid_at.is_some());
    // Lifetime accrual untouched, outstanding balance cleared.
    assert_eq!(fx.partner_counters().await, (dec!(150.00), dec!(0)));

    let err = fx
        .commissions
        .mark_paid(Actor::admin(Uuid::new_v4()), commission.id, "TRF-002")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidState { .. }));
}

#[tokio::test]
async fn repeated_approval_cannot_duplicate_commission() {
    let fx = Fixture::new().await;
    let request_id = fx.seed_quoted_request(dec!(1000.00)).await;
    let company = Actor::company(Uuid::new_v4());

    fx.workflow.approve(company, request_id).await.unwrap();
    let err = fx.workflow.approve(company, request_id).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidState { .. }));

    // The reconciliation path returns the existing row instead of creating
    // another one.
    let outcome = fx
        .commissions
        .generate_commission(Actor::admin(Uuid::new_v4()), request_id)
        .await
        .unwrap();
    assert!(matches!(outcome, CommissionOutcome::Existing(_)));

    assert_eq!(fx.partner_counters().await, (dec!(150.00), dec!(150.00)));
}

#[tokio::test]
async fn concurrent_approvals_settle_to_one_commission() {
    let fx = Fixture::new().await;
    let request_id = fx.seed_quoted_request(dec!(1000.00)).await;
    let company = Actor::company(Uuid::new_v4());

    let workflow = &fx.workflow;
    let (a, b) = tokio::join!(
        workflow.approve(company, request_id),
        workflow.approve(company, request_id)
    );
    assert!(
        a.is_ok() != b.is_ok(),
        "exactly one concurrent approval must win"
    );

    let mut tx = fx.store.begin().await.unwrap();
    let commission = tx
        .find_commission_by_audit_request(request_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(commission.amount, dec!(150.00));
    drop(tx);
    assert_eq!(fx.partner_counters().await, (dec!(150.00), dec!(150.00)));
}

#[tokio::test]
async fn later_rate_edits_do_not_touch_existing_commissions() {
    let fx = Fixture::new().await;
    let request_id = fx.seed_quoted_request(dec!(1000.00)).await;
    fx.workflow
        .approve(Actor::company(Uuid::new_v4()), request_id)
        .await
        .unwrap();

    {
        let mut tx = fx.store.begin().await.unwrap();
        let mut partner = tx.find_partner(fx.partner_id).await.unwrap().unwrap();
        partner.commission_rate = dec!(30);
        tx.update_partner(&partner).await.unwrap();
        tx.commit().await.unwrap();
    }

    let mut tx = fx.store.begin().await.unwrap();
    let commission = tx
        .find_commission_by_audit_request(request_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(commission.rate_percent, dec!(15));
    assert_eq!(commission.amount, dec!(150.00));
}

#[tokio::test]
async fn pending_counter_equals_sum_of_pending_commissions() {
    let fx = Fixture::new().await;
    let first = fx.seed_quoted_request(dec!(1000.00)).await;
    let second = fx.seed_quoted_request(dec!(333.33)).await;
    let company = Actor::company(Uuid::new_v4());

    fx.workflow.approve(company, first).await.unwrap();
    fx.workflow.approve(company, second).await.unwrap();

    // 150.00 + 50.00 accrued.
    assert_eq!(fx.partner_counters().await, (dec!(200.00), dec!(200.00)));

    let mut tx = fx.store.begin().await.unwrap();
    let commission = tx
        .find_commission_by_audit_request(first)
        .await
        .unwrap()
        .unwrap();
    drop(tx);
    fx.commissions
        .mark_paid(Actor::admin(Uuid::new_v4()), commission.id, "TRF-100")
        .await
        .unwrap();

    let mut tx = fx.store.begin().await.unwrap();
    let remaining = tx
        .find_commission_by_audit_request(second)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(remaining.status, CommissionStatus::Pending);
    drop(tx);
    assert_eq!(fx.partner_counters().await, (dec!(200.00), dec!(50.00)));
}

struct FailingNotifier;

#[async_trait]
impl NotificationPort for FailingNotifier {
    async fn notify(&self, _payload: NotificationPayload) -> StoreResult<()> {
        Err("smtp relay unreachable".into())
    }
}

#[derive(Default)]
struct RecordingTrail {
    entries: Mutex<Vec<AuditTrailEntry>>,
}

#[async_trait]
impl AuditTrailPort for RecordingTrail {
    async fn append(&self, entry: AuditTrailEntry) -> StoreResult<()> {
        self.entries.lock().await.push(entry);
        Ok(())
    }
}

#[tokio::test]
async fn notifier_outage_never_rolls_back_the_ledger() {
    let trail = Arc::new(RecordingTrail::default());
    let boundary = SettlementBoundary::new(Arc::new(FailingNotifier), trail.clone());
    let fx = Fixture::with_boundary(boundary).await;
    let request_id = fx.seed_quoted_request(dec!(1000.00)).await;

    let outcome = fx
        .workflow
        .approve(Actor::company(Uuid::new_v4()), request_id)
        .await
        .unwrap();
    assert!(matches!(outcome.commission, CommissionOutcome::Created(_)));
    assert_eq!(fx.partner_counters().await, (dec!(150.00), dec!(150.00)));

    // The trail still received entries for both operations.
    let entries = trail.entries.lock().await;
    assert!(entries.iter().any(|e| e.action == "approve"));
}
