use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::emission::InputMode;
use crate::layout::{ElementConfig, LeftInputStyle, Point};
use crate::sensor::{PermissionOutcome, SensorKind};

/// Identifier of one continuous touch or mouse engagement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactId {
    Touch(i64),
    Mouse,
}

/// Rotation-rate sample (degrees per second); axes the device did not report are `None`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionSample {
    pub at: DateTime<Local>,
    #[serde(default)]
    pub alpha: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
}

/// Orientation sample (degrees)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrientationSample {
    pub at: DateTime<Local>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub gamma: Option<f64>,
}

/// User changes coming from the settings panel and the element editor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SettingsCommand {
    SetMode { mode: InputMode },
    SetEditMode { enabled: bool },
    SetLookEnabled { enabled: bool },
    SetSteeringEnabled { enabled: bool },
    SetLookSensitivity { value: u8 },
    SetSteerSensitivity { value: u8 },
    SetLookInvert { x: bool, y: bool },
    SetShowDebug { enabled: bool },
    SetLeftStyle { style: LeftInputStyle },
    SetJoystickSize { size: f64 },
    ConfigureElement { id: String, config: ElementConfig },
    AddButton,
    RemoveElement { id: String },
    /// Back to the default style, sizes and buttons
    ResetLayout,
}

/// Everything the platform delivers to the engine, in arrival order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlatformEvent {
    ContactStart {
        contact: ContactId,
        at: DateTime<Local>,
        x: f64,
        y: f64,
        /// Landed on menu chrome (settings button, modal); never a control input
        #[serde(default)]
        chrome: bool,
    },
    ContactMove {
        contact: ContactId,
        at: DateTime<Local>,
        x: f64,
        y: f64,
    },
    ContactEnd {
        contact: ContactId,
        at: DateTime<Local>,
        x: f64,
        y: f64,
    },
    ContactCancel {
        contact: ContactId,
        at: DateTime<Local>,
    },
    Motion(MotionSample),
    Orientation(OrientationSample),
    Visibility {
        at: DateTime<Local>,
        hidden: bool,
    },
    Resize {
        width: f64,
        height: f64,
    },
    PermissionResult {
        sensor: SensorKind,
        outcome: PermissionOutcome,
    },
    Settings {
        command: SettingsCommand,
    },
}

impl PlatformEvent {
    pub fn contact_start(contact: ContactId, at: DateTime<Local>, p: Point) -> Self {
        Self::ContactStart {
            contact,
            at,
            x: p.x,
            y: p.y,
            chrome: false,
        }
    }

    pub fn contact_move(contact: ContactId, at: DateTime<Local>, p: Point) -> Self {
        Self::ContactMove {
            contact,
            at,
            x: p.x,
            y: p.y,
        }
    }

    pub fn contact_end(contact: ContactId, at: DateTime<Local>, p: Point) -> Self {
        Self::ContactEnd {
            contact,
            at,
            x: p.x,
            y: p.y,
        }
    }

    pub fn settings(command: SettingsCommand) -> Self {
        Self::Settings { command }
    }
}
