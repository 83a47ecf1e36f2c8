//! Integer currency arithmetic in minor units (cents).
//!
//! Balance math never touches floating point; amounts only become decimal
//! display values at the HTTP boundary, and only through this module.

pub const MINOR_UNITS_PER_UNIT: i64 = 100;

/// Equal share of `amount` between `participants` people, as
/// `(share, remainder)` with `share * participants + remainder == amount`.
pub fn equal_share(amount: i64, participants: usize) -> (i64, i64) {
    let count = participants as i64;
    (amount / count, amount % count)
}

/// Convert a display-currency value coming over the wire into minor units,
/// rounding half to even. Returns `None` for values that are not finite or
/// do not fit an `i64` once scaled.
pub fn to_minor_units(display: f64) -> Option<i64> {
    if !display.is_finite() {
        return None;
    }
    let scaled = (display * MINOR_UNITS_PER_UNIT as f64).round_ties_even();
    // Beyond 2^53 the scaling itself is no longer exact.
    if scaled.abs() > 9_007_199_254_740_992.0 {
        return None;
    }
    Some(scaled as i64)
}

/// Convert minor units back into a display value for responses.
pub fn to_display(minor: i64) -> f64 {
    minor as f64 / MINOR_UNITS_PER_UNIT as f64
}
