use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Role under which a workflow command is issued. Recorded verbatim in the
/// audit trail next to the actor id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorRole {
    Company,
    Partner,
    Auditor,
    Admin,
    System,
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorRole::Company => write!(f, "Company"),
            ActorRole::Partner => write!(f, "Partner"),
            ActorRole::Auditor => write!(f, "Auditor"),
            ActorRole::Admin => write!(f, "Admin"),
            ActorRole::System => write!(f, "System"),
        }
    }
}

impl FromStr for ActorRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Company" => Ok(ActorRole::Company),
            "Partner" => Ok(ActorRole::Partner),
            "Auditor" => Ok(ActorRole::Auditor),
            "Admin" => Ok(ActorRole::Admin),
            "System" => Ok(ActorRole::System),
            _ => Err(()),
        }
    }
}

/// Identity attached to every mutating operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub person_id: Uuid,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(person_id: Uuid, role: ActorRole) -> Self {
        Self { person_id, role }
    }

    pub fn admin(person_id: Uuid) -> Self {
        Self::new(person_id, ActorRole::Admin)
    }

    pub fn auditor(person_id: Uuid) -> Self {
        Self::new(person_id, ActorRole::Auditor)
    }

    pub fn partner(person_id: Uuid) -> Self {
        Self::new(person_id, ActorRole::Partner)
    }

    pub fn company(person_id: Uuid) -> Self {
        Self::new(person_id, ActorRole::Company)
    }

    /// Actor for transitions driven by external events (payment confirmation).
    pub fn system() -> Self {
        Self::new(Uuid::nil(), ActorRole::System)
    }
}
