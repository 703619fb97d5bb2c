//! Integration tests against a live PostgreSQL instance.
//!
//! Run with DATABASE_URL pointing at a scratch database:
//!   DATABASE_URL=postgres://localhost/auditoria_test cargo test -- --ignored

use std::sync::Arc;

use auditoria_core_api::domain::{Actor, QuoteCommand};
use auditoria_core_db::models::{AuditRequestStatus, CommissionStatus};
use auditoria_core_db::repository::{LedgerStore, LedgerTx};
use auditoria_core_db::service::{
    AuditWorkflowService, CommissionOutcome, CommissionService, SettlementBoundary,
};
use auditoria_core_db::test_utils::{
    create_test_audit_request, create_test_company, create_test_partner,
};
use auditoria_core_postgres::PgLedgerStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serial_test::serial;

async fn setup_store() -> PgLedgerStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for pg tests");
    let store = PgLedgerStore::connect(&url).await.expect("connect");
    sqlx::migrate!("./migrations")
        .run(store.pool())
        .await
        .expect("migrations");
    store
}

async fn seed_quoted_request(
    store: &PgLedgerStore,
    commission_rate: Decimal,
) -> (uuid::Uuid, uuid::Uuid) {
    let partner = create_test_partner(commission_rate, Decimal::ZERO);
    let company = create_test_company(Some(partner.id));
    let request = create_test_audit_request(company.id, Some(partner.id), AuditRequestStatus::Requested);

    let mut tx = store.begin().await.expect("begin");
    tx.create_partner(&partner).await.expect("partner");
    tx.create_company(&company).await.expect("company");
    tx.create_audit_request(&request).await.expect("request");
    tx.commit().await.expect("commit");

    (request.id, partner.id)
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL"]
async fn test_quote_approve_accrues_commission() {
    let store = Arc::new(setup_store().await);
    let workflow = AuditWorkflowService::new(Arc::clone(&store), SettlementBoundary::disabled());

    let (request_id, partner_id) = seed_quoted_request(&store, dec!(15)).await;

    let quoted = workflow
        .submit_quote(
            Actor::admin(uuid::Uuid::new_v4()),
            request_id,
            QuoteCommand {
                amount: dec!(1000),
                notes: None,
                validity_days: 30,
            },
        )
        .await
        .expect("quote");
    assert_eq!(quoted.status, AuditRequestStatus::Quoted);

    let outcome = workflow
        .approve(Actor::company(uuid::Uuid::new_v4()), request_id)
        .await
        .expect("approve");
    assert_eq!(outcome.request.status, AuditRequestStatus::Approved);
    assert!(matches!(outcome.commission, CommissionOutcome::Created(_)));

    let mut tx = store.begin().await.expect("begin");
    let commission = tx
        .find_commission_by_audit_request(request_id)
        .await
        .expect("lookup")
        .expect("commission exists");
    assert_eq!(commission.amount, dec!(150.00));
    assert_eq!(commission.status, CommissionStatus::Pending);

    let partner = tx
        .find_partner(partner_id)
        .await
        .expect("lookup")
        .expect("partner exists");
    assert_eq!(partner.total_commissions, dec!(150.00));
    assert_eq!(partner.pending_commissions, dec!(150.00));
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL"]
async fn test_mark_paid_settles_pending_only() {
    let store = Arc::new(setup_store().await);
    let workflow = AuditWorkflowService::new(Arc::clone(&store), SettlementBoundary::disabled());
    let commissions = CommissionService::new(Arc::clone(&store), SettlementBoundary::disabled());

    let (request_id, partner_id) = seed_quoted_request(&store, dec!(10)).await;
    let admin = Actor::admin(uuid::Uuid::new_v4());
    workflow
        .submit_quote(
            admin,
            request_id,
            QuoteCommand {
                amount: dec!(500),
                notes: None,
                validity_days: 30,
            },
        )
        .await
        .expect("quote");
    workflow
        .approve(Actor::company(uuid::Uuid::new_v4()), request_id)
        .await
        .expect("approve");

    let mut tx = store.begin().await.expect("begin");
    let commission = tx
        .find_commission_by_audit_request(request_id)
        .await
        .expect("lookup")
        .expect("commission exists");
    drop(tx);

    let paid = commissions
        .mark_paid(admin, commission.id, "TRF-2024-001")
        .await
        .expect("mark paid");
    assert_eq!(paid.status, CommissionStatus::Paid);
    assert!(paid.paid_at.is_some());

    let mut tx = store.begin().await.expect("begin");
    let partner = tx
        .find_partner(partner_id)
        .await
        .expect("lookup")
        .expect("partner exists");
    assert_eq!(partner.total_commissions, dec!(50.00));
    assert_eq!(partner.pending_commissions, dec!(0.00));
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL"]
async fn test_deduct_hours_caps_at_available_balance() {
    let store = setup_store().await;

    let partner = create_test_partner(dec!(10), dec!(3));
    let mut tx = store.begin().await.expect("begin");
    tx.create_partner(&partner).await.expect("partner");
    tx.commit().await.expect("commit");

    let mut tx = store.begin().await.expect("begin");
    let split = tx
        .deduct_hours_up_to(partner.id, dec!(5))
        .await
        .expect("deduct");
    assert_eq!(split.deducted, dec!(3));
    assert_eq!(split.excess, dec!(2));
    tx.commit().await.expect("commit");

    let mut tx = store.begin().await.expect("begin");
    let after = tx
        .find_partner(partner.id)
        .await
        .expect("lookup")
        .expect("partner exists");
    assert_eq!(after.hours_balance, dec!(0));
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL"]
async fn test_negative_balance_is_never_raised_by_deduction() {
    let store = setup_store().await;

    // A manually adjusted partner can sit below zero; deducting more hours
    // must not pull the balance toward zero.
    let partner = create_test_partner(dec!(10), dec!(-2));
    let mut tx = store.begin().await.expect("begin");
    tx.create_partner(&partner).await.expect("partner");
    tx.commit().await.expect("commit");

    let mut tx = store.begin().await.expect("begin");
    let split = tx
        .deduct_hours_up_to(partner.id, dec!(4))
        .await
        .expect("deduct");
    assert_eq!(split.deducted, dec!(0));
    assert_eq!(split.excess, dec!(4));
    tx.commit().await.expect("commit");

    let mut tx = store.begin().await.expect("begin");
    let after = tx
        .find_partner(partner.id)
        .await
        .expect("lookup")
        .expect("partner exists");
    assert_eq!(after.hours_balance, dec!(-2));
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL"]
async fn test_dropped_transaction_rolls_back() {
    let store = setup_store().await;

    let partner = create_test_partner(dec!(10), Decimal::ZERO);
    let mut tx = store.begin().await.expect("begin");
    tx.create_partner(&partner).await.expect("partner");
    drop(tx);

    let mut tx = store.begin().await.expect("begin");
    let found = tx.find_partner(partner.id).await.expect("lookup");
    assert!(found.is_none());
}
