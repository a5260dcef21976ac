//! # Sensor fusion
//!
//! Two independent pipelines driven by device sensors:
//!
//! - [`look`]: rotation rate ──► relative look delta (`gyro`)
//! - [`steering`]: orientation tilt ──► absolute left-stick X (`axes`)
//!
//! Each pipeline owns a [`SensorState`] and only processes samples while it is
//! enabled *and* its permission was granted. Switching a toggle on always
//! starts a fresh [`permission::PermissionRequest`].

pub mod gauge;
pub mod look;
pub mod permission;
pub mod steering;

pub use look::{LookPipeline, LookReading};
pub use permission::PermissionRequest;
pub use steering::{SteeringPipeline, SteeringReading};

use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_SENSITIVITY: u8 = 1;
pub const MAX_SENSITIVITY: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Rotation rate, drives mouse look
    Look,
    /// Orientation tilt, drives the steering axis
    Steering,
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Look => write!(f, "look"),
            SensorKind::Steering => write!(f, "steering"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionStatus {
    #[default]
    Unasked,
    Granted,
    Denied,
}

/// Platform answer to a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOutcome {
    Granted,
    Denied,
    Unsupported,
}

/// Per-sensor toggle, permission and tuning state
#[derive(Debug, Clone)]
pub struct SensorState {
    kind: SensorKind,
    enabled: bool,
    permission: PermissionStatus,
    sensitivity: u8,
    pub invert_x: bool,
    pub invert_y: bool,
}

impl SensorState {
    pub fn new(kind: SensorKind, sensitivity: u8) -> Self {
        Self {
            kind,
            enabled: false,
            permission: PermissionStatus::Unasked,
            sensitivity: clamp_sensitivity(sensitivity),
            invert_x: false,
            invert_y: false,
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn permission(&self) -> PermissionStatus {
        self.permission
    }

    /// Samples are processed only while enabled with permission.
    pub fn is_active(&self) -> bool {
        self.enabled && self.permission == PermissionStatus::Granted
    }

    pub fn sensitivity(&self) -> u8 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, value: u8) {
        self.sensitivity = clamp_sensitivity(value);
    }

    /// Switches the toggle on; permission must be asked again.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.permission = PermissionStatus::Unasked;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Records the answer; anything but a grant switches the toggle back off.
    pub fn apply_permission(&mut self, outcome: PermissionOutcome) {
        match outcome {
            PermissionOutcome::Granted => self.permission = PermissionStatus::Granted,
            PermissionOutcome::Denied | PermissionOutcome::Unsupported => {
                self.permission = PermissionStatus::Denied;
                self.enabled = false;
            }
        }
    }
}

pub fn clamp_sensitivity(value: u8) -> u8 {
    value.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY)
}
