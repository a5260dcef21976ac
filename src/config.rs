//! Static configuration read at startup: broker link, initial viewport and input tuning.
//!
//! Values the user changes at runtime live in [`crate::persistence::PersistedSettings`].

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::layout::Viewport;
use crate::persistence::SettingsError;

const CONFIG_DIR: &str = "touchlink";
const CONFIG_FILE: &str = "config.toml";

/// Broker connection of the MQTT-backed message channel
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LinkConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// Topic the control events are published to
    pub outbound_topic: String,
    /// Topic carrying feedback (`error` messages) from the remote side
    pub inbound_topic: String,
    pub keep_alive_secs: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "touchlink".to_string(),
            outbound_topic: "touchlink/input".to_string(),
            inbound_topic: "touchlink/feedback".to_string(),
            keep_alive_secs: 5,
        }
    }
}

/// Thresholds and gains of the gesture and sensor pipelines
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InputTuning {
    /// Background drag gain
    pub pointer_sensitivity: f64,
    /// A background contact shorter than this may be a tap
    pub tap_max_ms: u64,
    /// ... and must end closer than this to where it started
    pub tap_max_distance: f64,
    /// Delay between the synthetic left press and its release
    pub tap_release_delay_ms: u64,
    /// Edit-mode movement (either axis) that turns a tap into a drag
    pub edit_drag_threshold: f64,
    /// Knob travel as a fraction of half the joystick side
    pub joystick_radius_ratio: f64,

    pub look_min_interval_ms: u64,
    pub look_deadzone: f64,
    /// Per sensitivity step
    pub look_scale: f64,

    pub steer_alpha: f64,
    pub steer_deadzone_radius: u8,
    pub steer_max_tilt_base: f64,
    pub steer_max_tilt_slope: f64,
    pub steer_max_tilt_floor: f64,
}

impl Default for InputTuning {
    fn default() -> Self {
        Self {
            pointer_sensitivity: 1.5,
            tap_max_ms: 200,
            tap_max_distance: 10.0,
            tap_release_delay_ms: 50,
            edit_drag_threshold: 5.0,
            joystick_radius_ratio: 0.6,
            look_min_interval_ms: 16,
            look_deadzone: 0.2,
            look_scale: 0.1,
            steer_alpha: 0.25,
            steer_deadzone_radius: 10,
            steer_max_tilt_base: 70.0,
            steer_max_tilt_slope: 2.5,
            steer_max_tilt_floor: 5.0,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub link: LinkConfig,
    pub viewport: Viewport,
    pub tuning: InputTuning,
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        toml::from_str(content).map_err(|e| SettingsError::Decode(e.to_string()))
    }

    /// Reads the config file; a missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            warn!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file: {}", e))?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
