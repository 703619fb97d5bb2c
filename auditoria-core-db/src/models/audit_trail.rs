use auditoria_core_api::domain::{Actor, ActorRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrailEntityType {
    AuditRequest,
    Commission,
    ConsultationRequest,
    Partner,
}

impl From<TrailEntityType> for &str {
    fn from(val: TrailEntityType) -> Self {
        match val {
            TrailEntityType::AuditRequest => "AUDIT_REQUEST",
            TrailEntityType::Commission => "COMMISSION",
            TrailEntityType::ConsultationRequest => "CONSULTATION_REQUEST",
            TrailEntityType::Partner => "PARTNER",
        }
    }
}

/// # Documentation
/// - One audit-trail record per successful mutating operation.
/// - Appended after commit through the settlement boundary; the sink is
///   write-only and external, so append failures never roll back the
///   operation that produced the entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrailEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub actor_role: ActorRole,
    pub action: String,
    pub entity_type: TrailEntityType,
    pub entity_id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl AuditTrailEntry {
    pub fn record(
        actor: Actor,
        action: impl Into<String>,
        entity_type: TrailEntityType,
        entity_id: Uuid,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id: actor.person_id,
            actor_role: actor.role,
            action: action.into(),
            entity_type,
            entity_id,
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}
