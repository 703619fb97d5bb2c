use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Identifiable;

/// Fixed-hour consultation category. Categories flagged `is_custom` take
/// their hours from the quote command instead of this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationCategoryModel {
    pub id: Uuid,
    pub name: HeaplessString<100>,
    pub hours: Decimal,
    pub is_custom: bool,
}

impl Identifiable for ConsultationCategoryModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
