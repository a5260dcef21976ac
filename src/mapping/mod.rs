//! Value mapping primitives shared by the gesture and sensor pipelines.
//!
//! Everything in here is pure or near-pure: the [`quantizer`] turns real-valued
//! displacements into 8-bit axis values, the [`filter`] smooths a scalar stream,
//! and [`RateLimiter`] decides whether a timestamped sample may pass.
//!
//! ```text
//! raw value ──► scale ──► (smooth) ──► floor/clamp ──► (dead zone) ──► axis u8
//! ```

pub mod filter;
pub mod quantizer;

pub use filter::SmoothingFilter;
pub use quantizer::{deadzone_collapse, quantize, quantize_level, scale, AXIS_MAX, NEUTRAL};

use chrono::{DateTime, Local};

/// Timestamp-driven rate limiter for sensor samples.
///
/// Compares sample timestamps, never the wall clock.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Minimum spacing between accepted samples (in milliseconds)
    min_interval_ms: i64,

    /// Timestamp of the last accepted sample
    last_accepted: Option<DateTime<Local>>,
}

impl RateLimiter {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms: min_interval_ms as i64,
            last_accepted: None,
        }
    }

    /// Returns true and records `at` when the sample is far enough from the last accepted one.
    pub fn should_process(&mut self, at: DateTime<Local>) -> bool {
        if let Some(last) = self.last_accepted {
            let elapsed = (at - last).num_milliseconds();
            if elapsed < self.min_interval_ms {
                return false;
            }
        }
        self.last_accepted = Some(at);
        true
    }

    pub fn last_accepted(&self) -> Option<DateTime<Local>> {
        self.last_accepted
    }

    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

/// Rounds half-way cases towards positive infinity (`-0.5 -> 0`, `0.5 -> 1`).
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}
