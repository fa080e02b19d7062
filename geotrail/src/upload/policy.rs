//! Interval and movement policy helpers.
//!
//! Small pure functions that keep the controller free of inline arithmetic.
//! None of them can fail: durations saturate instead of overflowing.

use std::time::Duration;

/// Constrain `value` to `[min, max]`.
///
/// If the bounds are inverted, `min` wins, matching the controller's rule
/// that the minimum interval is always honoured after a success.
pub fn clamp_interval(value: Duration, min: Duration, max: Duration) -> Duration {
    value.min(max).max(min)
}

/// Double `value`, capped at `max`.
///
/// This is one step of the exponential back-off applied after each failed
/// upload.
pub fn double_capped(value: Duration, max: Duration) -> Duration {
    value.saturating_mul(2).min(max)
}

/// Whether a move of `distance_m` metres is significant.
///
/// Reaching the threshold exactly counts as a move.
pub fn is_significant_move(distance_m: f64, threshold_m: f64) -> bool {
    distance_m >= threshold_m
}

/// The interval after one more idle tick: `current + increment`, capped at `max`.
pub fn grow_idle_interval(current: Duration, increment: Duration, max: Duration) -> Duration {
    current.saturating_add(increment).min(max)
}
