use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::AuditTrailEntry;
use crate::repository::StoreResult;

/// Structured payload handed to the external notifier (email in production).
#[derive(Debug, Clone)]
pub struct NotificationPayload {
    pub recipient_id: Uuid,
    pub subject: String,
    pub body: String,
    /// Money or hours figure the message is about, when there is one.
    pub amount: Option<Decimal>,
}

/// External email/notification collaborator.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn notify(&self, payload: NotificationPayload) -> StoreResult<()>;
}

/// Write-only external audit-trail sink.
#[async_trait]
pub trait AuditTrailPort: Send + Sync {
    async fn append(&self, entry: AuditTrailEntry) -> StoreResult<()>;
}

/// Observes committed ledger events and fans them out to the notifier and
/// the audit trail. Runs strictly after the transaction commits; failures
/// here are logged and swallowed, they never roll back or fail the primary
/// operation.
#[derive(Clone)]
pub struct SettlementBoundary {
    notifier: Arc<dyn NotificationPort>,
    trail: Arc<dyn AuditTrailPort>,
}

impl SettlementBoundary {
    pub fn new(notifier: Arc<dyn NotificationPort>, trail: Arc<dyn AuditTrailPort>) -> Self {
        Self { notifier, trail }
    }

    /// Boundary that discards everything. Useful for wiring contexts where
    /// no notifier is configured.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NullNotifier), Arc::new(NullAuditTrail))
    }

    pub async fn publish(&self, entry: AuditTrailEntry, notifications: Vec<NotificationPayload>) {
        let action = entry.action.clone();
        if let Err(err) = self.trail.append(entry).await {
            tracing::warn!(%action, error = %err, "audit trail append failed");
        }
        for payload in notifications {
            if let Err(err) = self.notifier.notify(payload).await {
                tracing::warn!(%action, error = %err, "notification dispatch failed");
            }
        }
    }
}

pub struct NullNotifier;

#[async_trait]
impl NotificationPort for NullNotifier {
    async fn notify(&self, _payload: NotificationPayload) -> StoreResult<()> {
        Ok(())
    }
}

pub struct NullAuditTrail;

#[async_trait]
impl AuditTrailPort for NullAuditTrail {
    async fn append(&self, _entry: AuditTrailEntry) -> StoreResult<()> {
        Ok(())
    }
}
