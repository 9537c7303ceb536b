//! GMF withholding arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};

/// Computes the withholding over a signed base sum: `base_sum * 4/1000`,
/// rounded to 2 decimal places with Banker's Rounding.
///
/// The result keeps the base sum's sign; the concept's sign class decides
/// the stored sign afterwards.
#[must_use]
pub fn withholding(base_sum: Decimal) -> Decimal {
    (base_sum * Decimal::new(4, 3))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}
