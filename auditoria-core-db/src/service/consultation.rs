use auditoria_core_api::domain::{Actor, CotizacionCommand};
use auditoria_core_api::error::{ApiError, ApiResult};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    AuditTrailEntry, ConsultationRequestModel, ConsultationStatus, TrailEntityType,
};
use crate::repository::{LedgerStore, LedgerTx};
use crate::service::boundary::{NotificationPayload, SettlementBoundary};

const ENTITY: &str = "consultation request";

/// Result of quoting or accepting a consultation.
#[derive(Debug, Clone)]
pub struct CotizacionResultado {
    pub consultation: ConsultationRequestModel,
    /// True when the urgency flag short-circuited explicit acceptance.
    pub auto_accepted: bool,
    /// Hours actually taken from the partner's balance.
    pub horas_descontadas: Decimal,
    /// Shortfall beyond the prepaid balance, reported for administrative
    /// follow-up; settlement policy for it is a business decision outside
    /// this engine.
    pub horas_excedidas: Decimal,
}

/// Consultation quoting & hours engine.
///
/// Non-urgent requests are quoted and deducted only at explicit partner
/// acceptance; urgent requests auto-accept at quote time and deduct
/// immediately, honoring the work even beyond the prepaid balance.
pub struct ConsultationService<S> {
    store: Arc<S>,
    boundary: SettlementBoundary,
}

impl<S: LedgerStore> ConsultationService<S> {
    pub fn new(store: Arc<S>, boundary: SettlementBoundary) -> Self {
        Self { store, boundary }
    }

    async fn load(tx: &mut dyn LedgerTx, id: Uuid) -> ApiResult<ConsultationRequestModel> {
        tx.find_consultation(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("{ENTITY} {id}")))
    }

    /// Quotes a consultation in hours, from a fixed-hour category or a custom
    /// value. Re-quoting while still Pending/Quoted overwrites the previous
    /// assignment; once accepted the hours are immutable.
    pub async fn cotizar_consulta(
        &self,
        actor: Actor,
        consultation_id: Uuid,
        cmd: CotizacionCommand,
    ) -> ApiResult<CotizacionResultado> {
        cmd.check()?;

        let mut tx = self.store.begin().await?;
        let mut consultation = Self::load(tx.as_mut(), consultation_id).await?;
        let before = consultation.status;
        if !matches!(
            before,
            ConsultationStatus::Pending | ConsultationStatus::Quoted
        ) {
            return Err(ApiError::invalid_state(ENTITY, "cotizar_consulta", before));
        }

        let category = tx
            .find_consultation_category(cmd.category_id)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("consultation category {}", cmd.category_id))
            })?;
        let assigned_hours = if category.is_custom {
            cmd.custom_hours.ok_or_else(|| {
                ApiError::ValidationError(format!(
                    "category {} requires explicit custom hours",
                    category.name
                ))
            })?
        } else {
            category.hours
        };

        let now = Utc::now();
        consultation.category_id = Some(category.id);
        consultation.assigned_hours = Some(assigned_hours);
        consultation.quoted_at = Some(now);

        if consultation.urgent {
            // Urgent path: skip explicit acceptance and deduct in the same
            // transaction, capped at the available balance.
            let split = tx
                .deduct_hours_up_to(consultation.partner_id, assigned_hours)
                .await?;
            consultation.status = ConsultationStatus::Accepted;
            consultation.accepted_at = Some(now);
            tx.update_consultation(&consultation).await?;
            tx.commit().await?;
            tracing::info!(
                consultation_id = %consultation.id,
                deducted = %split.deducted,
                excess = %split.excess,
                "urgent consultation auto-accepted"
            );

            let mut notifications = vec![NotificationPayload {
                recipient_id: consultation.partner_id,
                subject: "Urgent consultation accepted".into(),
                body: format!(
                    "Your urgent consultation was quoted at {assigned_hours}h and accepted; {}h were deducted from your balance.",
                    split.deducted
                ),
                amount: Some(split.deducted),
            }];
            if split.excess > Decimal::ZERO {
                notifications.push(NotificationPayload {
                    recipient_id: actor.person_id,
                    subject: "Urgent consultation exceeded prepaid hours".into(),
                    body: format!(
                        "Consultation {consultation_id} was auto-accepted with {}h beyond the partner's balance.",
                        split.excess
                    ),
                    amount: Some(split.excess),
                });
            }
            self.boundary
                .publish(
                    AuditTrailEntry::record(
                        actor,
                        "cotizar_consulta",
                        TrailEntityType::ConsultationRequest,
                        consultation.id,
                        format!(
                            "status {before} -> {}, {assigned_hours}h assigned, {}h deducted, {}h exceeded",
                            consultation.status, split.deducted, split.excess
                        ),
                    ),
                    notifications,
                )
                .await;

            return Ok(CotizacionResultado {
                consultation,
                auto_accepted: true,
                horas_descontadas: split.deducted,
                horas_excedidas: split.excess,
            });
        }

        consultation.status = ConsultationStatus::Quoted;
        tx.update_consultation(&consultation).await?;
        tx.commit().await?;

        self.boundary
            .publish(
                AuditTrailEntry::record(
                    actor,
                    "cotizar_consulta",
                    TrailEntityType::ConsultationRequest,
                    consultation.id,
                    format!(
                        "status {before} -> {}, {assigned_hours}h assigned",
                        consultation.status
                    ),
                ),
                vec![NotificationPayload {
                    recipient_id: consultation.partner_id,
                    subject: "Consultation quoted".into(),
                    body: format!(
                        "Your consultation was quoted at {assigned_hours}h, pending your acceptance."
                    ),
                    amount: Some(assigned_hours),
                }],
            )
            .await;

        Ok(CotizacionResultado {
            consultation,
            auto_accepted: false,
            horas_descontadas: Decimal::ZERO,
            horas_excedidas: Decimal::ZERO,
        })
    }

    /// Explicit partner acceptance of a quoted consultation. Runs the same
    /// capped deduction the urgent path applies at quote time.
    pub async fn aceptar_cotizacion(
        &self,
        actor: Actor,
        consultation_id: Uuid,
    ) -> ApiResult<CotizacionResultado> {
        let mut tx = self.store.begin().await?;
        let mut consultation = Self::load(tx.as_mut(), consultation_id).await?;
        let before = consultation.status;
        if before != ConsultationStatus::Quoted {
            return Err(ApiError::invalid_state(ENTITY, "aceptar_cotizacion", before));
        }
        let Some(assigned_hours) = consultation.assigned_hours else {
            return Err(ApiError::PreconditionFailed(format!(
                "{ENTITY} {consultation_id} has no assigned hours"
            )));
        };

        let split = tx
            .deduct_hours_up_to(consultation.partner_id, assigned_hours)
            .await?;
        consultation.status = ConsultationStatus::Accepted;
        consultation.accepted_at = Some(Utc::now());
        tx.update_consultation(&consultation).await?;
        tx.commit().await?;

        let mut notifications = vec![];
        if split.excess > Decimal::ZERO {
            notifications.push(NotificationPayload {
                recipient_id: actor.person_id,
                subject: "Consultation exceeded prepaid hours".into(),
                body: format!(
                    "Consultation {consultation_id} was accepted with {}h beyond the partner's balance.",
                    split.excess
                ),
                amount: Some(split.excess),
            });
        }
        self.boundary
            .publish(
                AuditTrailEntry::record(
                    actor,
                    "aceptar_cotizacion",
                    TrailEntityType::ConsultationRequest,
                    consultation.id,
                    format!(
                        "status {before} -> {}, {}h deducted, {}h exceeded",
                        consultation.status, split.deducted, split.excess
                    ),
                ),
                notifications,
            )
            .await;

        Ok(CotizacionResultado {
            consultation,
            auto_accepted: false,
            horas_descontadas: split.deducted,
            horas_excedidas: split.excess,
        })
    }

    /// Partner turns the quote down; nothing was deducted yet.
    pub async fn rechazar_cotizacion(
        &self,
        actor: Actor,
        consultation_id: Uuid,
    ) -> ApiResult<ConsultationRequestModel> {
        self.transition(
            actor,
            consultation_id,
            "rechazar_cotizacion",
            ConsultationStatus::Quoted,
            ConsultationStatus::Rejected,
        )
        .await
    }

    pub async fn iniciar_consulta(
        &self,
        actor: Actor,
        consultation_id: Uuid,
    ) -> ApiResult<ConsultationRequestModel> {
        self.transition(
            actor,
            consultation_id,
            "iniciar_consulta",
            ConsultationStatus::Accepted,
            ConsultationStatus::InProgress,
        )
        .await
    }

    pub async fn completar_consulta(
        &self,
        actor: Actor,
        consultation_id: Uuid,
    ) -> ApiResult<ConsultationRequestModel> {
        self.transition(
            actor,
            consultation_id,
            "completar_consulta",
            ConsultationStatus::InProgress,
            ConsultationStatus::Completed,
        )
        .await
    }

    /// Cancels a consultation from any non-terminal state. Hours already
    /// deducted at acceptance stay consumed.
    pub async fn cancelar_consulta(
        &self,
        actor: Actor,
        consultation_id: Uuid,
    ) -> ApiResult<ConsultationRequestModel> {
        let mut tx = self.store.begin().await?;
        let mut consultation = Self::load(tx.as_mut(), consultation_id).await?;
        let before = consultation.status;
        if before.is_terminal() {
            return Err(ApiError::invalid_state(ENTITY, "cancelar_consulta", before));
        }

        consultation.status = ConsultationStatus::Cancelled;
        consultation.finished_at = Some(Utc::now());
        tx.update_consultation(&consultation).await?;
        tx.commit().await?;

        self.boundary
            .publish(
                AuditTrailEntry::record(
                    actor,
                    "cancelar_consulta",
                    TrailEntityType::ConsultationRequest,
                    consultation.id,
                    format!("status {before} -> {}", consultation.status),
                ),
                vec![],
            )
            .await;

        Ok(consultation)
    }

    async fn transition(
        &self,
        actor: Actor,
        consultation_id: Uuid,
        operation: &'static str,
        from: ConsultationStatus,
        to: ConsultationStatus,
    ) -> ApiResult<ConsultationRequestModel> {
        let mut tx = self.store.begin().await?;
        let mut consultation = Self::load(tx.as_mut(), consultation_id).await?;
        let before = consultation.status;
        if before != from {
            return Err(ApiError::invalid_state(ENTITY, operation, before));
        }

        let now = Utc::now();
        consultation.status = to;
        match to {
            ConsultationStatus::InProgress => consultation.started_at = Some(now),
            ConsultationStatus::Completed | ConsultationStatus::Rejected => {
                consultation.finished_at = Some(now)
            }
            _ => {}
        }
        tx.update_consultation(&consultation).await?;
        tx.commit().await?;

        self.boundary
            .publish(
                AuditTrailEntry::record(
                    actor,
                    operation,
                    TrailEntityType::ConsultationRequest,
                    consultation.id,
                    format!("status {before} -> {}", consultation.status),
                ),
                vec![],
            )
            .await;

        Ok(consultation)
    }
}
