//! Application settings (`config.toml`).
//!
//! ```toml
//! model = "xl"
//! save_debounce_secs = 5
//! default_profile = "~/decks/main.json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::path::home_expand;
use crate::device::DeviceModel;
use crate::error::{DeckError, Result};
use crate::persistence::DEFAULT_SAVE_DELAY;

/// Settings that apply to every profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckSettings {
    /// Device model used for key count and icon size.
    pub model: DeviceModel,
    /// Seconds between the first unsaved change and the write.
    pub save_debounce_secs: u64,
    /// Profile used when a command is given no profile path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<PathBuf>,
}

impl Default for DeckSettings {
    fn default() -> Self {
        Self {
            model: DeviceModel::default(),
            save_debounce_secs: DEFAULT_SAVE_DELAY.as_secs(),
            default_profile: None,
        }
    }
}

impl DeckSettings {
    /// `$XDG_CONFIG_HOME/deck/config.toml` or the platform equivalent.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("deck").join("config.toml"))
    }

    /// Load from `path`, or from [`Self::default_path`] when `None`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            debug!("No config directory, using default settings");
            return Ok(Self::default());
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(DeckError::Io(e)),
        };

        let mut settings = Self::from_toml(&content)?;
        if let Some(profile) = &settings.default_profile {
            settings.default_profile = Some(home_expand(profile)?);
        }
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DeckError::ConfigParse(format!("TOML: {e}")))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DeckError::ConfigParse(format!("TOML: {e}")))
    }

    #[must_use]
    pub const fn save_delay(&self) -> Duration {
        Duration::from_secs(self.save_debounce_secs)
    }
}
