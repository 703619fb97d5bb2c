use crate::error::ApiResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("amount_not_positive"));
    }
    Ok(())
}

/// Quote terms submitted by an auditor/admin for an audit request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuoteCommand {
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    pub notes: Option<String>,
    #[validate(range(min = 1, max = 365))]
    pub validity_days: u16,
}

impl QuoteCommand {
    pub fn check(&self) -> ApiResult<()> {
        Ok(self.validate()?)
    }
}

/// Hours assignment for a consultation. `custom_hours` is only honored when
/// the referenced category is flagged custom.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CotizacionCommand {
    pub category_id: Uuid,
    #[validate(custom(function = "validate_positive_amount"))]
    pub custom_hours: Option<Decimal>,
}

impl CotizacionCommand {
    pub fn check(&self) -> ApiResult<()> {
        Ok(self.validate()?)
    }
}

/// Administrative registration of revenue earned outside the normal
/// audit-request flow. Runs through the same commission accrual path.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ManualIncomeCommand {
    pub partner_id: Uuid,
    pub company_id: Uuid,
    #[validate(custom(function = "validate_positive_amount"))]
    pub base_amount: Decimal,
    pub fiscal_year: i32,
}

impl ManualIncomeCommand {
    pub fn check(&self) -> ApiResult<()> {
        Ok(self.validate()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn quote_command_rejects_non_positive_amount() {
        let cmd = QuoteCommand {
            amount: dec!(0),
            notes: None,
            validity_days: 30,
        };
        assert!(cmd.validate().is_err());

        let cmd = QuoteCommand {
            amount: dec!(-10.00),
            notes: None,
            validity_days: 30,
        };
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn quote_command_rejects_zero_validity() {
        let cmd = QuoteCommand {
            amount: dec!(1000.00),
            notes: None,
            validity_days: 0,
        };
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn cotizacion_command_allows_absent_custom_hours() {
        let cmd = CotizacionCommand {
            category_id: Uuid::new_v4(),
            custom_hours: None,
        };
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn cotizacion_command_rejects_non_positive_custom_hours() {
        let cmd = CotizacionCommand {
            category_id: Uuid::new_v4(),
            custom_hours: Some(dec!(0)),
        };
        assert!(cmd.validate().is_err());
    }
}
