//! # Persistence Module
//!
//! Client-side state that survives restarts: the values of the settings panel,
//! the left-input style with its size map, the right-zone layout and the last
//! selected mode. The engine reads these once at startup and hands back a new
//! snapshot whenever the user changes something.
//!
//! ## Error Handling Strategy
//! Decoding and encoding report [`SettingsError`]. File access goes through
//! [`settings_store::SettingsFile`], which uses `color_eyre` for context. A
//! missing file degrades to defaults instead of preventing startup.

pub mod settings_store;

pub use settings_store::SettingsFile;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::emission::InputMode;
use crate::layout::{LayoutElement, LeftInputStyle};

pub const DEFAULT_GYRO_SENSITIVITY: u8 = 5;
pub const DEFAULT_STEER_SENSITIVITY: u8 = 10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("Failed to decode settings: {0}")]
    Decode(String),

    #[error("Failed to encode settings: {0}")]
    Encode(String),
}

/// Snapshot of everything the settings panel and layout editor persist
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PersistedSettings {
    pub mode: InputMode,
    pub left_style: LeftInputStyle,
    pub gyro_sensitivity: u8,
    pub steer_sensitivity: u8,
    pub invert_x: bool,
    pub invert_y: bool,
    pub show_debug: bool,
    /// Per-element sizes; the joystick uses [`crate::layout::JOYSTICK_SIZE_KEY`]
    pub element_sizes: HashMap<String, f64>,
    /// Right-zone buttons as last arranged; `None` means the default face buttons
    pub right_zone: Option<Vec<LayoutElement>>,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            mode: InputMode::default(),
            left_style: LeftInputStyle::default(),
            gyro_sensitivity: DEFAULT_GYRO_SENSITIVITY,
            steer_sensitivity: DEFAULT_STEER_SENSITIVITY,
            invert_x: false,
            invert_y: false,
            show_debug: false,
            element_sizes: HashMap::new(),
            right_zone: None,
        }
    }
}

impl PersistedSettings {
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        toml::from_str(content).map_err(|e| SettingsError::Decode(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        toml::to_string_pretty(self).map_err(|e| SettingsError::Encode(e.to_string()))
    }
}
