//! Counter animation as a pure function of elapsed time.
//!
//! Whatever drives the display (a timer, a render-loop tick) asks for the
//! value at the current elapsed time; nothing here schedules anything.

use std::time::Duration;

/// Cubic ease-out on `t` in `[0, 1]`; inputs outside the range are clamped.
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = if t.is_nan() { 1.0 } else { t.clamp(0.0, 1.0) };
    1.0 - (1.0 - t).powi(3)
}

/// Value between `start` and `end` after `elapsed` of a `duration`-long
/// animation.
pub fn interpolate(start: f64, end: f64, elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() || elapsed >= duration {
        return end;
    }
    let progress = elapsed.as_secs_f64() / duration.as_secs_f64();
    start + (end - start) * ease_out_cubic(progress)
}

/// A display counter moving from one value to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterAnimation {
    pub start: f64,
    pub end: f64,
    pub duration: Duration,
}

impl CounterAnimation {
    pub fn new(start: f64, end: f64, duration: Duration) -> Self {
        Self {
            start,
            end,
            duration,
        }
    }

    pub fn value_at(&self, elapsed: Duration) -> f64 {
        interpolate(self.start, self.end, elapsed, self.duration)
    }

    /// Value rounded for display
    pub fn display_at(&self, elapsed: Duration) -> i64 {
        self.value_at(elapsed).round() as i64
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}
