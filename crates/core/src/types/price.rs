//! Currency amounts using decimal arithmetic.
//!
//! Catalog prices and line totals are kept as exact [`Decimal`] values in the
//! currency's major unit. The payment processor works in minor units
//! (cents), so conversions in both directions live here.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of minor units per major unit (cents per real/dollar).
const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Convert a major-unit amount to minor units.
///
/// Rounds half away from zero, so `0.005` becomes `1` cent.
/// Returns `None` if the value does not fit in an `i64`.
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    let scaled = amount.checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))?;
    i64::try_from(scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)).ok()
}

/// Convert a minor-unit amount (e.g. the processor's `amount_total`) to major units.
#[must_use]
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Round an amount to two decimal places for display.
#[must_use]
pub fn round_for_display(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn converts_whole_amounts() {
        assert_eq!(to_minor_units(dec!(10.00)), Some(1000));
        assert_eq!(to_minor_units(dec!(0.10)), Some(10));
    }

    #[test]
    fn rounds_half_cent_up() {
        assert_eq!(to_minor_units(dec!(0.005)), Some(1));
        assert_eq!(to_minor_units(dec!(0.0049)), Some(0));
        assert_eq!(to_minor_units(dec!(1.115)), Some(112));
    }

    #[test]
    fn minor_units_round_trip_to_major() {
        assert_eq!(from_minor_units(1999), dec!(19.99));
        assert_eq!(from_minor_units(10), dec!(0.10));
    }
}
