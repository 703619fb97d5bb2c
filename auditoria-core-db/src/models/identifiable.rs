use uuid::Uuid;

/// Ledger entities keyed by a UUID primary key.
pub trait Identifiable {
    fn get_id(&self) -> Uuid;
}
