//! Orientation tilt to the left-stick X axis.
//!
//! ```text
//! tilt ─► minus reference ─► clamp ±max_tilt ─► scale 0..255 ─► smooth ─► floor ─► dead zone ─► LX
//! ```
//!
//! The reference is taken from the first sample after (re)enable. The tilt
//! axis depends on the screen aspect: beta in landscape, gamma in portrait.

use tracing::debug;

use super::{SensorKind, SensorState};
use crate::config::InputTuning;
use crate::controller::OrientationSample;
use crate::mapping::{deadzone_collapse, quantize_level, scale, SmoothingFilter, NEUTRAL};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SteeringReading {
    /// The selected tilt axis was missing from the sample
    NoData,
    Sample {
        landscape: bool,
        beta: Option<f64>,
        gamma: Option<f64>,
        relative: f64,
        max_tilt: f64,
        output: u8,
    },
}

#[derive(Debug)]
pub struct SteeringPipeline {
    pub state: SensorState,
    filter: SmoothingFilter,
    reference: Option<f64>,
    tilt_base: f64,
    tilt_slope: f64,
    tilt_floor: f64,
    deadzone_radius: u8,
    last: Option<SteeringReading>,
}

impl SteeringPipeline {
    pub fn new(sensitivity: u8, tuning: &InputTuning) -> Self {
        Self {
            state: SensorState::new(SensorKind::Steering, sensitivity),
            filter: SmoothingFilter::new(tuning.steer_alpha),
            reference: None,
            tilt_base: tuning.steer_max_tilt_base,
            tilt_slope: tuning.steer_max_tilt_slope,
            tilt_floor: tuning.steer_max_tilt_floor,
            deadzone_radius: tuning.steer_deadzone_radius,
            last: None,
        }
    }

    /// Tilt (degrees) that maps to full deflection; narrows as sensitivity rises.
    pub fn max_tilt(&self) -> f64 {
        (self.tilt_base - self.state.sensitivity() as f64 * self.tilt_slope).max(self.tilt_floor)
    }

    pub fn reference(&self) -> Option<f64> {
        self.reference
    }

    pub fn last_reading(&self) -> Option<SteeringReading> {
        self.last
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Switches the toggle on; the next sample becomes the new zero.
    pub fn enable(&mut self) {
        self.state.enable();
        self.reference = None;
    }

    /// Switches the toggle off and re-seeds the filter at neutral.
    pub fn disable(&mut self) {
        self.state.disable();
        self.reference = None;
        self.filter.reset(NEUTRAL as f64);
        self.last = None;
    }

    /// Processes one sample; returns the new X value when one was produced.
    pub fn process(&mut self, sample: &OrientationSample, landscape: bool) -> Option<u8> {
        if !self.state.is_active() {
            return None;
        }
        let Some(tilt) = (if landscape { sample.beta } else { sample.gamma }) else {
            self.last = Some(SteeringReading::NoData);
            return None;
        };

        let reference = *self.reference.get_or_insert_with(|| {
            debug!("Steering zero reference set at {:.1}°", tilt);
            tilt
        });
        let relative = tilt - reference;
        let max_tilt = self.max_tilt();
        let delta = relative.clamp(-max_tilt, max_tilt);

        let raw = scale(delta, -max_tilt, max_tilt);
        let smoothed = self.filter.update(raw);
        let output = deadzone_collapse(quantize_level(smoothed), NEUTRAL, self.deadzone_radius);

        self.last = Some(SteeringReading::Sample {
            landscape,
            beta: sample.beta,
            gamma: sample.gamma,
            relative,
            max_tilt,
            output,
        });
        Some(output)
    }
}
