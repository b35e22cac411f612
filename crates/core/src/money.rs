//! Money arithmetic in minor currency units.
//!
//! All prices and totals are integers in the smallest currency unit (e.g.
//! cents), so sums over order lines are exact and never drift.

use crate::error::{DomainError, DomainResult};

/// Amount in the smallest currency unit (e.g. cents).
pub type MinorUnits = u64;

/// `unit_price * quantity`, failing on overflow instead of wrapping.
pub fn line_total(unit_price: MinorUnits, quantity: u64) -> DomainResult<MinorUnits> {
    unit_price
        .checked_mul(quantity)
        .ok_or_else(|| DomainError::validation("line total overflows"))
}

/// Exact sum of line totals, failing on overflow instead of wrapping.
pub fn sum_totals(totals: impl IntoIterator<Item = MinorUnits>) -> DomainResult<MinorUnits> {
    totals.into_iter().try_fold(0u64, |acc, t| {
        acc.checked_add(t)
            .ok_or_else(|| DomainError::validation("order total overflows"))
    })
}
