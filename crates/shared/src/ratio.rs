//! Guarded ratio arithmetic.
//!
//! Every ratio the dashboard shows is computed over a collection that may be
//! empty. These helpers short-circuit to 0 on a zero denominator instead of
//! producing NaN or infinity.

/// Rounds half-up to the nearest integer (`floor(x + 0.5)`).
///
/// Differs from [`f64::round`] for negative halves: `-2.5` rounds to `-2`.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Divides `numerator` by `denominator`, returning 0 when the denominator is zero.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Whole-number percentage of `part` in `whole`, 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    round_half_up(part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0) as u32
}
