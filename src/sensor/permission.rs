//! Sensor permission request with compile-time state safety via statum.
//!
//! A request is created when a sensor toggle is switched on and resolved by
//! the platform's answer. Resolution consumes the pending request, so each
//! request's continuation runs at most once.

use chrono::{DateTime, Local};
use statum::{machine, state};
use tracing::{info, warn};

use super::{PermissionOutcome, SensorKind};

#[state]
#[derive(Debug, Clone)]
pub enum PermissionPhase {
    Pending,
    Resolved(PermissionOutcome),
}

#[machine]
#[derive(Debug)]
pub struct PermissionRequest<S: PermissionPhase> {
    sensor: SensorKind,
    requested_at: DateTime<Local>,
}

impl<S: PermissionPhase> PermissionRequest<S> {
    pub fn sensor(&self) -> SensorKind {
        self.sensor
    }

    pub fn requested_at(&self) -> DateTime<Local> {
        self.requested_at
    }
}

impl PermissionRequest<Pending> {
    pub fn open(sensor: SensorKind, requested_at: DateTime<Local>) -> Self {
        info!("Requesting {} sensor permission", sensor);
        Self::new(sensor, requested_at)
    }

    /// Applies the platform's answer and closes the request.
    pub fn resolve(self, outcome: PermissionOutcome) -> PermissionRequest<Resolved> {
        match outcome {
            PermissionOutcome::Granted => info!("{} sensor permission granted", self.sensor),
            PermissionOutcome::Denied => warn!("{} sensor permission denied", self.sensor),
            PermissionOutcome::Unsupported => {
                warn!("{} sensor not supported on this device", self.sensor)
            }
        }
        self.transition_with(outcome)
    }
}

impl PermissionRequest<Resolved> {
    pub fn outcome(&self) -> PermissionOutcome {
        self.get_state_data()
            .copied()
            .unwrap_or(PermissionOutcome::Denied)
    }

    pub fn is_granted(&self) -> bool {
        self.outcome() == PermissionOutcome::Granted
    }
}
