//! Single-pole exponential smoothing.

use super::quantizer::NEUTRAL;

/// Residual below which the filter lands exactly on its target.
///
/// Without it a held full deflection converges to `255 - ulp` and floors to 254.
const SETTLE_EPSILON: f64 = 1e-6;

/// Exponential filter with one scalar of memory.
///
/// `smoothed = prev + alpha * (raw - prev)`.
#[derive(Debug, Clone)]
pub struct SmoothingFilter {
    alpha: f64,
    prev: f64,
}

impl SmoothingFilter {
    /// Creates a filter seeded at the axis neutral.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            prev: NEUTRAL as f64,
        }
    }

    pub fn update(&mut self, raw: f64) -> f64 {
        let mut smoothed = self.prev + self.alpha * (raw - self.prev);
        if (raw - smoothed).abs() < SETTLE_EPSILON {
            smoothed = raw;
        }
        self.prev = smoothed;
        smoothed
    }

    /// Re-seeds the memory, typically with the last rendered output.
    pub fn reset(&mut self, seed: f64) {
        self.prev = seed;
    }

    pub fn previous(&self) -> f64 {
        self.prev
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}
