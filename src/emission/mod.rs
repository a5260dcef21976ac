//! # Emission
//!
//! Outbound control events and the machinery that delivers them.
//!
//! ```text
//! gestures / sensors ──► Outbox ──► EmissionGate ──► MessageChannel
//!                          │
//!                          └─ deferred (tap release) ──► Session timer ──► EmissionGate
//! ```
//!
//! Every event leaves through [`gate::EmissionGate::send`]. Nothing is queued
//! while the channel is closed.

pub mod gate;
pub mod session;
pub mod state;

pub use gate::{EmissionGate, GateStats};
pub use session::{Session, SessionSignal};
pub use state::SessionState;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::mapping::NEUTRAL;

/// Overall input scheme applied by the remote side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InputMode {
    #[default]
    Gamepad,
    Wasd,
    Arrow,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::Gamepad => write!(f, "GAMEPAD"),
            InputMode::Wasd => write!(f, "WASD"),
            InputMode::Arrow => write!(f, "ARROW"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MouseButton {
    Left,
    Right,
}

/// Left stick state, 128 on both axes at rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlAxisPair {
    #[serde(rename = "LX")]
    pub lx: u8,
    #[serde(rename = "LY")]
    pub ly: u8,
}

impl Default for ControlAxisPair {
    fn default() -> Self {
        Self::neutral()
    }
}

impl ControlAxisPair {
    pub fn neutral() -> Self {
        Self {
            lx: NEUTRAL,
            ly: NEUTRAL,
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.lx == NEUTRAL && self.ly == NEUTRAL
    }
}

/// Outbound wire message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlEvent {
    Mode { mode: InputMode },
    Axes { axes: ControlAxisPair },
    Btn { id: String, val: u8 },
    Key { key: String, val: u8 },
    Gyro { x: i32, y: i32 },
    MouseMove { x: i32, y: i32 },
    MouseBtn { id: MouseButton, val: u8 },
}

impl ControlEvent {
    pub fn axes(axes: ControlAxisPair) -> Self {
        Self::Axes { axes }
    }

    pub fn mouse_button(id: MouseButton, pressed: bool) -> Self {
        Self::MouseBtn {
            id,
            val: pressed as u8,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ControlEvent::Mode { .. } => "mode",
            ControlEvent::Axes { .. } => "axes",
            ControlEvent::Btn { .. } => "btn",
            ControlEvent::Key { .. } => "key",
            ControlEvent::Gyro { .. } => "gyro",
            ControlEvent::MouseMove { .. } => "mouse_move",
            ControlEvent::MouseBtn { .. } => "mouse_btn",
        }
    }
}

/// Inbound wire message; anything but `error` is ignored
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Error {
        message: String,
    },
    #[serde(other)]
    Other,
}

/// Event to emit `delay` after the session queues it
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredEvent {
    pub delay: Duration,
    pub event: ControlEvent,
}

/// Collects the events produced while handling one platform event
#[derive(Debug, Default)]
pub struct Outbox {
    pub immediate: Vec<ControlEvent>,
    pub deferred: Vec<DeferredEvent>,
}

impl Outbox {
    pub fn push(&mut self, event: ControlEvent) {
        self.immediate.push(event);
    }

    pub fn defer(&mut self, delay: Duration, event: ControlEvent) {
        self.deferred.push(DeferredEvent { delay, event });
    }

    pub fn is_empty(&self) -> bool {
        self.immediate.is_empty() && self.deferred.is_empty()
    }
}
