use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Identifiable;

/// Client company owning audit requests. Only the reference data the ledger
/// core needs; full company administration is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyModel {
    pub id: Uuid,
    pub name: HeaplessString<100>,
    pub tax_id: Option<HeaplessString<20>>,
    pub referring_partner_id: Option<Uuid>,
}

impl Identifiable for CompanyModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
