//! Rotation rate to relative look deltas (`gyro`), rate limited per sample timestamp.

use tracing::debug;

use super::{SensorKind, SensorState};
use crate::config::InputTuning;
use crate::controller::MotionSample;
use crate::emission::ControlEvent;
use crate::mapping::{round_half_up, RateLimiter};

/// Last processed rotation-rate sample and the deltas derived from it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookReading {
    pub rate_alpha: f64,
    pub rate_beta: f64,
    pub dx: f64,
    pub dy: f64,
}

/// Rotation rate to relative look deltas
#[derive(Debug)]
pub struct LookPipeline {
    pub state: SensorState,
    limiter: RateLimiter,
    deadzone: f64,
    scale: f64,
    last: Option<LookReading>,
}

impl LookPipeline {
    pub fn new(sensitivity: u8, tuning: &InputTuning) -> Self {
        Self {
            state: SensorState::new(SensorKind::Look, sensitivity),
            limiter: RateLimiter::new(tuning.look_min_interval_ms),
            deadzone: tuning.look_deadzone,
            scale: tuning.look_scale,
            last: None,
        }
    }

    pub fn last_reading(&self) -> Option<LookReading> {
        self.last
    }

    /// Switches the toggle on; the rate limit starts over.
    pub fn enable(&mut self) {
        self.state.enable();
        self.limiter.reset();
    }

    pub fn disable(&mut self) {
        self.state.disable();
        self.limiter.reset();
        self.last = None;
    }

    /// Processes one sample; returns the `gyro` event when either delta survives the dead zone.
    pub fn process(&mut self, sample: &MotionSample) -> Option<ControlEvent> {
        if !self.state.is_active() {
            return None;
        }
        // a sample without rates still occupies its slot
        if !self.limiter.should_process(sample.at) {
            return None;
        }
        if sample.alpha.is_none() && sample.beta.is_none() {
            return None;
        }

        let mult = self.state.sensitivity() as f64 * self.scale;
        let mut dx = sample.alpha.map(|a| -a * mult).unwrap_or(0.0);
        let mut dy = sample.beta.map(|b| -b * mult).unwrap_or(0.0);

        if self.state.invert_x {
            dx = -dx;
        }
        if self.state.invert_y {
            dy = -dy;
        }
        if dx.abs() < self.deadzone {
            dx = 0.0;
        }
        if dy.abs() < self.deadzone {
            dy = 0.0;
        }

        self.last = Some(LookReading {
            rate_alpha: sample.alpha.unwrap_or(0.0),
            rate_beta: sample.beta.unwrap_or(0.0),
            dx,
            dy,
        });

        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        debug!("Look delta ({:.2}, {:.2})", dx, dy);
        Some(ControlEvent::Gyro {
            x: round_half_up(dx),
            y: round_half_up(dy),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::PermissionOutcome;
    use chrono::{DateTime, Duration, Local};

    fn active(sensitivity: u8) -> LookPipeline {
        let mut look = LookPipeline::new(sensitivity, &InputTuning::default());
        look.enable();
        look.state.apply_permission(PermissionOutcome::Granted);
        look
    }

    fn sample(at: DateTime<Local>, alpha: Option<f64>, beta: Option<f64>) -> MotionSample {
        MotionSample { at, alpha, beta }
    }

    #[test]
    fn rates_are_negated_and_scaled() {
        let mut look = active(5);
        let t = Local::now();
        // mult = 0.5
        assert_eq!(
            look.process(&sample(t, Some(10.0), Some(-4.0))),
            Some(ControlEvent::Gyro { x: -5, y: 2 })
        );
    }

    #[test]
    fn inversion_flips_each_axis() {
        let mut look = active(10);
        look.state.invert_x = true;
        let t = Local::now();
        assert_eq!(
            look.process(&sample(t, Some(3.0), Some(3.0))),
            Some(ControlEvent::Gyro { x: 3, y: -3 })
        );
    }

    #[test]
    fn small_deltas_are_zeroed() {
        let mut look = active(1);
        let t = Local::now();
        // 1.9 * 0.1 = 0.19 < 0.2 on both axes
        assert_eq!(look.process(&sample(t, Some(1.9), Some(-1.9))), None);
        let reading = look.last_reading().unwrap();
        assert_eq!((reading.dx, reading.dy), (0.0, 0.0));
    }

    #[test]
    fn samples_inside_sixteen_ms_are_dropped() {
        let mut look = active(10);
        let t = Local::now();
        let mut emitted = Vec::new();
        for ms in [0, 5, 15, 16, 20, 33, 40] {
            let at = t + Duration::milliseconds(ms);
            if look.process(&sample(at, Some(5.0), None)).is_some() {
                emitted.push(ms);
            }
        }
        assert_eq!(emitted, vec![0, 16, 33]);
    }

    #[test]
    fn missing_rates_consume_the_slot() {
        let mut look = active(10);
        let t = Local::now();
        assert_eq!(look.process(&sample(t, None, None)), None);
        assert_eq!(
            look.process(&sample(t + Duration::milliseconds(8), Some(5.0), None)),
            None
        );
    }

    #[test]
    fn inactive_pipeline_emits_nothing() {
        let mut look = LookPipeline::new(5, &InputTuning::default());
        look.enable();
        assert_eq!(look.process(&sample(Local::now(), Some(50.0), None)), None);
        assert!(look.last_reading().is_none());
    }
}
