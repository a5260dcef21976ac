use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::PersistedSettings;

const SETTINGS_DIR: &str = "touchlink";
const SETTINGS_FILE: &str = "settings.toml";

/// TOML file backing [`PersistedSettings`]
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/touchlink/settings.toml`, if the platform has a data dir.
    pub fn default_location() -> Option<Self> {
        dirs::data_dir().map(|dir| Self::new(dir.join(SETTINGS_DIR).join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<PersistedSettings> {
        if !tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| eyre!("Failed to check if settings file exists: {}", e))?
        {
            warn!(
                "Settings file {} does not exist, using defaults",
                self.path.display()
            );
            return Ok(PersistedSettings::default());
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| eyre!("Failed to read settings file: {}", e))?;
        let settings = PersistedSettings::from_toml(&content)
            .map_err(|e| eyre!("Failed to parse settings file: {}", e))?;

        info!("Loaded settings from {}", self.path.display());
        Ok(settings)
    }

    pub async fn save(&self, settings: &PersistedSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !tokio::fs::try_exists(parent)
                .await
                .map_err(|e| eyre!("Failed to check if settings directory exists: {}", e))?
            {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| eyre!("Failed to create settings directory: {}", e))?;
            }
        }

        let content = settings
            .to_toml()
            .map_err(|e| eyre!("Failed to serialize settings: {}", e))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| eyre!("Failed to write settings file: {}", e))?;

        debug!("Settings saved to {}", self.path.display());
        Ok(())
    }
}
