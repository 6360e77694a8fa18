//! Decimal money helpers.
//!
//! Prices are stored as `NUMERIC(10, 2)` and carried as [`Decimal`] end to
//! end so totals never pick up floating point error.

use rust_decimal::{Decimal, RoundingStrategy};

/// Total for `quantity` units at `unit_price`.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Format an amount for display (e.g. `$19.90`).
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    format!(
        "${:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}
