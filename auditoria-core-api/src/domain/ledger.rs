use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Money is carried as fixed-point decimals rounded to the currency's minor
/// unit. Commission math must never run through binary floats.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Computes `base × rate / 100`, rounded to the minor unit.
///
/// This is the single source of truth for commission math; both the normal
/// approval path and manual income registration go through it.
pub fn apply_percentage(base: Decimal, rate_percent: Decimal) -> Decimal {
    (base * rate_percent / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Outcome of a capped hours deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursSplit {
    /// Hours actually taken from the balance.
    pub deducted: Decimal,
    /// Shortfall beyond the available balance (`horas excedidas`).
    pub excess: Decimal,
}

/// Splits a requested deduction against an available balance.
///
/// The deduction is capped at the available balance so this path can drain a
/// balance to zero but never drive it negative. `deducted + excess` always
/// equals `requested`.
pub fn split_hours_deduction(available: Decimal, requested: Decimal) -> HoursSplit {
    let available = available.max(Decimal::ZERO);
    let deducted = requested.min(available);
    HoursSplit {
        deducted,
        excess: requested - deducted,
    }
}
