//! Average rating arithmetic.
//!
//! A work's rating comes from two sources: ratings attached to viewing logs
//! and standalone rating records. Each source is reduced to a
//! [`RatingTally`] in SQL; this module combines the tallies.

use serde::Serialize;

/// Lowest accepted rating.
pub const MIN_RATING: f64 = 1.0;

/// Highest accepted rating.
pub const MAX_RATING: f64 = 5.0;

/// Sum and count of the ratings from one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RatingTally {
    pub sum: f64,
    pub count: i64,
}

impl RatingTally {
    pub fn new(sum: Option<f64>, count: i64) -> Self {
        Self {
            sum: sum.unwrap_or(0.0),
            count,
        }
    }
}

/// Combine tallies into one mean rounded to one decimal place.
///
/// Returns `None` when no source has any rating.
pub fn combine_average(tallies: &[RatingTally]) -> Option<f64> {
    let count: i64 = tallies.iter().map(|t| t.count).sum();
    if count == 0 {
        return None;
    }
    let sum: f64 = tallies.iter().map(|t| t.sum).sum();
    Some(round_one_decimal(sum / count as f64))
}

/// Round to one decimal place, ties to even.
///
/// A tie is decided on the exact binary value: `3.25` is a true midpoint and
/// becomes `3.2`, while `4.35` is stored slightly below the midpoint and
/// becomes `4.3`.
pub fn round_one_decimal(value: f64) -> f64 {
    let scaled = value * 10.0;
    let floor = scaled.floor();
    if scaled - floor != 0.5 {
        return scaled.round() / 10.0;
    }

    // The product may land on .5 only through rounding; the fused
    // multiply-add keeps the sign of the exact distance to the midpoint.
    let midpoint = 2.0 * floor + 1.0;
    let offset = value.mul_add(20.0, -midpoint);
    let rounded = if offset == 0.0 {
        scaled.round_ties_even()
    } else if offset < 0.0 {
        floor
    } else {
        floor + 1.0
    };
    rounded / 10.0
}

/// Whether `value` lies inside the accepted rating range.
pub fn is_valid_rating(value: f64) -> bool {
    value.is_finite() && (MIN_RATING..=MAX_RATING).contains(&value)
}
