use auditoria_core_api::domain::{Actor, QuoteCommand};
use auditoria_core_api::error::{ApiError, ApiResult};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{AuditRequestModel, AuditRequestStatus, AuditTrailEntry, TrailEntityType};
use crate::repository::{LedgerStore, LedgerTx};
use crate::service::boundary::{NotificationPayload, SettlementBoundary};
use crate::service::commission::{generate_commission_in_tx, CommissionOutcome};

const ENTITY: &str = "audit request";

/// Approval result: the updated request plus whatever the commission engine
/// did for it inside the same transaction.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub request: AuditRequestModel,
    pub commission: CommissionOutcome,
}

/// State machine governing the audit-request lifecycle.
///
/// Each operation validates the current state, applies the transition and
/// commits inside one store transaction; the settlement boundary observes
/// the result afterwards and may fail freely.
pub struct AuditWorkflowService<S> {
    store: Arc<S>,
    boundary: SettlementBoundary,
}

impl<S: LedgerStore> AuditWorkflowService<S> {
    pub fn new(store: Arc<S>, boundary: SettlementBoundary) -> Self {
        Self { store, boundary }
    }

    async fn load(tx: &mut dyn LedgerTx, id: Uuid) -> ApiResult<AuditRequestModel> {
        tx.find_audit_request(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("{ENTITY} {id}")))
    }

    /// Issues (or re-issues) a quote. Allowed from Requested, InReview and
    /// Quoted; a re-quote overwrites the previous terms.
    pub async fn submit_quote(
        &self,
        actor: Actor,
        request_id: Uuid,
        cmd: QuoteCommand,
    ) -> ApiResult<AuditRequestModel> {
        cmd.check()?;

        let mut tx = self.store.begin().await?;
        let mut request = Self::load(tx.as_mut(), request_id).await?;
        let before = request.status;
        if !matches!(
            before,
            AuditRequestStatus::Requested
                | AuditRequestStatus::InReview
                | AuditRequestStatus::Quoted
        ) {
            return Err(ApiError::invalid_state(ENTITY, "submit_quote", before));
        }

        let now = Utc::now();
        request.quoted_amount = Some(cmd.amount);
        if cmd.notes.is_some() {
            request.quote_notes = cmd.notes.clone();
        }
        request.quote_valid_until = Some(now + Duration::days(i64::from(cmd.validity_days)));
        request.status = AuditRequestStatus::Quoted;
        request.quoted_at = Some(now);
        tx.update_audit_request(&request).await?;
        tx.commit().await?;

        self.boundary
            .publish(
                AuditTrailEntry::record(
                    actor,
                    "submit_quote",
                    TrailEntityType::AuditRequest,
                    request.id,
                    format!("status {before} -> {}, amount {}", request.status, cmd.amount),
                ),
                vec![NotificationPayload {
                    recipient_id: request.company_id,
                    subject: "Audit quote available".into(),
                    body: format!(
                        "Your audit request was quoted at {} (valid for {} days).",
                        cmd.amount, cmd.validity_days
                    ),
                    amount: Some(cmd.amount),
                }],
            )
            .await;

        Ok(request)
    }

    /// Client-side approval of a quote. Stamps the decision, and when the
    /// request carries a referring partner, generates the commission in the
    /// same transaction.
    ///
    /// Commission generation is best-effort: a business failure there is
    /// logged and the approval still commits, because approval is the
    /// client-facing contract and commission bookkeeping is recoverable via
    /// the standalone reconciliation call.
    pub async fn approve(&self, actor: Actor, request_id: Uuid) -> ApiResult<ApprovalOutcome> {
        let mut tx = self.store.begin().await?;
        let mut request = Self::load(tx.as_mut(), request_id).await?;
        let before = request.status;
        if before != AuditRequestStatus::Quoted {
            return Err(ApiError::invalid_state(ENTITY, "approve", before));
        }
        let Some(amount) = request.quoted_amount else {
            return Err(ApiError::PreconditionFailed(format!(
                "{ENTITY} {request_id} has no quoted amount"
            )));
        };

        let now = Utc::now();
        // Expiry is enforced lazily at decision time; there is no sweeper.
        if let Some(valid_until) = request.quote_valid_until {
            if valid_until < now {
                return Err(ApiError::PreconditionFailed(format!(
                    "quote expired on {valid_until}"
                )));
            }
        }

        request.status = AuditRequestStatus::Approved;
        request.decided_at = Some(now);
        tx.update_audit_request(&request).await?;

        let commission = match generate_commission_in_tx(tx.as_mut(), &request, now).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    audit_request_id = %request.id,
                    error = %err,
                    "commission generation failed during approval, left for reconciliation"
                );
                CommissionOutcome::Deferred
            }
        };
        tx.commit().await?;
        tracing::info!(
            audit_request_id = %request.id,
            from = %before,
            to = %request.status,
            "audit request approved"
        );

        let mut notifications = vec![NotificationPayload {
            recipient_id: request.company_id,
            subject: "Audit request approved".into(),
            body: format!("The engagement was approved at {amount}."),
            amount: Some(amount),
        }];
        if let CommissionOutcome::Created(c) = &commission {
            notifications.push(NotificationPayload {
                recipient_id: c.partner_id,
                subject: "Commission accrued".into(),
                body: format!(
                    "A commission of {} ({}% of {}) is now pending.",
                    c.amount, c.rate_percent, c.base_amount
                ),
                amount: Some(c.amount),
            });
        }
        self.boundary
            .publish(
                AuditTrailEntry::record(
                    actor,
                    "approve",
                    TrailEntityType::AuditRequest,
                    request.id,
                    format!("status {before} -> {}", request.status),
                ),
                notifications,
            )
            .await;

        Ok(ApprovalOutcome {
            request,
            commission,
        })
    }

    /// Client-side rejection of a quote; the reason, if given, is appended to
    /// the quote notes.
    pub async fn reject(
        &self,
        actor: Actor,
        request_id: Uuid,
        reason: Option<String>,
    ) -> ApiResult<AuditRequestModel> {
        let mut tx = self.store.begin().await?;
        let mut request = Self::load(tx.as_mut(), request_id).await?;
        let before = request.status;
        if before != AuditRequestStatus::Quoted {
            return Err(ApiError::invalid_state(ENTITY, "reject", before));
        }

        if let Some(reason) = reason {
            request.quote_notes = Some(match request.quote_notes.take() {
                Some(notes) => format!("{notes}\nRejected: {reason}"),
                None => format!("Rejected: {reason}"),
            });
        }
        request.status = AuditRequestStatus::Rejected;
        request.decided_at = Some(Utc::now());
        tx.update_audit_request(&request).await?;
        tx.commit().await?;

        self.boundary
            .publish(
                AuditTrailEntry::record(
                    actor,
                    "reject",
                    TrailEntityType::AuditRequest,
                    request.id,
                    format!("status {before} -> {}", request.status),
                ),
                vec![],
            )
            .await;

        Ok(request)
    }

    /// Client-driven alternative to approve/reject: asks for a meeting to
    /// discuss the quote.
    pub async fn request_meeting(
        &self,
        actor: Actor,
        request_id: Uuid,
        feedback: Option<String>,
    ) -> ApiResult<AuditRequestModel> {
        let mut tx = self.store.begin().await?;
        let mut request = Self::load(tx.as_mut(), request_id).await?;
        let before = request.status;
        if before != AuditRequestStatus::Quoted {
            return Err(ApiError::invalid_state(ENTITY, "request_meeting", before));
        }

        if let Some(feedback) = feedback {
            request.quote_notes = Some(match request.quote_notes.take() {
                Some(notes) => format!("{notes}\nMeeting requested: {feedback}"),
                None => format!("Meeting requested: {feedback}"),
            });
        }
        request.status = AuditRequestStatus::MeetingRequested;
        tx.update_audit_request(&request).await?;
        tx.commit().await?;

        self.boundary
            .publish(
                AuditTrailEntry::record(
                    actor,
                    "request_meeting",
                    TrailEntityType::AuditRequest,
                    request.id,
                    format!("status {before} -> {}", request.status),
                ),
                vec![],
            )
            .await;

        Ok(request)
    }

    /// Moves an approved engagement into execution. Triggered by the external
    /// payment-confirmation event.
    pub async fn start(&self, actor: Actor, request_id: Uuid) -> ApiResult<AuditRequestModel> {
        let mut tx = self.store.begin().await?;
        let mut request = Self::load(tx.as_mut(), request_id).await?;
        let before = request.status;
        if before != AuditRequestStatus::Approved {
            return Err(ApiError::invalid_state(ENTITY, "start", before));
        }

        request.status = AuditRequestStatus::InProgress;
        request.started_at = Some(Utc::now());
        tx.update_audit_request(&request).await?;
        tx.commit().await?;

        self.boundary
            .publish(
                AuditTrailEntry::record(
                    actor,
                    "start",
                    TrailEntityType::AuditRequest,
                    request.id,
                    format!("status {before} -> {}", request.status),
                ),
                vec![],
            )
            .await;

        Ok(request)
    }

    /// Finishes an engagement. Blocked while any document request tied to
    /// this audit is still open.
    pub async fn complete(&self, actor: Actor, request_id: Uuid) -> ApiResult<AuditRequestModel> {
        let mut tx = self.store.begin().await?;
        let mut request = Self::load(tx.as_mut(), request_id).await?;
        let before = request.status;
        if before != AuditRequestStatus::InProgress {
            return Err(ApiError::invalid_state(ENTITY, "complete", before));
        }

        let open = tx.count_open_document_requests(request_id).await?;
        if open > 0 {
            return Err(ApiError::PreconditionFailed(format!(
                "{open} document request(s) still open for {ENTITY} {request_id}"
            )));
        }

        request.status = AuditRequestStatus::Completed;
        request.finished_at = Some(Utc::now());
        tx.update_audit_request(&request).await?;
        tx.commit().await?;

        self.boundary
            .publish(
                AuditTrailEntry::record(
                    actor,
                    "complete",
                    TrailEntityType::AuditRequest,
                    request.id,
                    format!("status {before} -> {}", request.status),
                ),
                vec![NotificationPayload {
                    recipient_id: request.company_id,
                    subject: "Audit completed".into(),
                    body: "Your audit engagement has been completed.".into(),
                    amount: None,
                }],
            )
            .await;

        Ok(request)
    }

    /// Cancels a request from any non-terminal state.
    pub async fn cancel(&self, actor: Actor, request_id: Uuid) -> ApiResult<AuditRequestModel> {
        let mut tx = self.store.begin().await?;
        let mut request = Self::load(tx.as_mut(), request_id).await?;
        let before = request.status;
        if before.is_terminal() {
            return Err(ApiError::invalid_state(ENTITY, "cancel", before));
        }

        request.status = AuditRequestStatus::Cancelled;
        tx.update_audit_request(&request).await?;
        tx.commit().await?;

        self.boundary
            .publish(
                AuditTrailEntry::record(
                    actor,
                    "cancel",
                    TrailEntityType::AuditRequest,
                    request.id,
                    format!("status {before} -> {}", request.status),
                ),
                vec![],
            )
            .await;

        Ok(request)
    }
}
