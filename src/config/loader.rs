//! Reading and writing profile documents.
//!
//! Profiles are JSON by default; `.yaml`/`.yml` files are read and written
//! as YAML. Writes go through a sibling temp file and a rename, so a crash
//! mid-save never leaves a truncated profile behind.

use std::path::Path;

use tracing::{debug, info, instrument, trace};

use super::schema::ProfileDocument;
use crate::error::{DeckError, Result};

/// Supported profile file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFormat {
    /// JSON (.json).
    Json,
    /// YAML (.yaml, .yml).
    Yaml,
}

impl ProfileFormat {
    /// Detect format from file extension.
    ///
    /// Returns `None` if the extension is not recognized.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        trace!(extension = %ext, "Detecting profile format from extension");
        match ext.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    fn detect(path: &Path) -> Result<Self> {
        Self::from_extension(path).ok_or_else(|| DeckError::UnsupportedFormat {
            path: path.display().to_string(),
        })
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

/// Load a profile from disk.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_profile<P: AsRef<Path>>(path: P) -> Result<ProfileDocument> {
    let path = path.as_ref();
    let format = ProfileFormat::detect(path)?;

    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DeckError::ProfileNotFound {
                path: path.display().to_string(),
            }
        } else {
            DeckError::Io(e)
        }
    })?;
    debug!(bytes = content.len(), ?format, "Read profile file");

    let profile = parse_profile(&content, format)?;
    info!(
        name = %profile.name,
        pages = profile.root.page_count(),
        "Profile loaded"
    );
    Ok(profile)
}

/// Parse a profile from a string in the given format.
pub fn parse_profile(content: &str, format: ProfileFormat) -> Result<ProfileDocument> {
    match format {
        ProfileFormat::Json => {
            serde_json::from_str(content).map_err(|e| DeckError::ProfileParse(format!("JSON: {e}")))
        }
        ProfileFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| DeckError::ProfileParse(format!("YAML: {e}")))
        }
    }
}

/// Serialize a profile in the given format.
pub fn render_profile(profile: &ProfileDocument, format: ProfileFormat) -> Result<String> {
    match format {
        ProfileFormat::Json => serde_json::to_string_pretty(profile)
            .map_err(|e| DeckError::ProfileParse(format!("JSON: {e}"))),
        ProfileFormat::Yaml => {
            serde_yaml::to_string(profile).map_err(|e| DeckError::ProfileParse(format!("YAML: {e}")))
        }
    }
}

/// Write a profile to disk, creating parent directories as needed.
#[instrument(skip(profile), fields(path = %path.as_ref().display()))]
pub fn save_profile<P: AsRef<Path>>(profile: &ProfileDocument, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = ProfileFormat::detect(path)?;
    let content = render_profile(profile, format)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;

    info!(
        bytes = path.metadata().map(|m| m.len()).unwrap_or(0),
        "Profile saved"
    );
    Ok(())
}
