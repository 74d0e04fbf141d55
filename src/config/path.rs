//! Path helpers for profile files and icon images.
//!
//! Supports absolute paths, paths relative to the profile file, and "~"
//! home directory expansion.

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{DeckError, Result};

/// Resolve the user's home directory (cross-platform).
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| DeckError::Other("Could not determine home directory".to_string()))
}

/// Expand a leading `~` to the home directory. Other paths are unchanged.
pub fn home_expand(path: &Path) -> Result<PathBuf> {
    let text = path.to_string_lossy();
    if text == "~" {
        return home_dir();
    }
    match text.strip_prefix("~/") {
        Some(rest) => Ok(home_dir()?.join(rest)),
        None => Ok(path.to_path_buf()),
    }
}

/// Resolve an icon file reference found in a profile.
///
/// Resolution rules:
/// 1. `file://` URIs lose the scheme
/// 2. Paths starting with `~` are expanded to the home directory
/// 3. Absolute paths are used as-is
/// 4. Relative paths are resolved against the profile's directory
pub fn resolve_icon_file(file: &str, profile_dir: &Path) -> Result<PathBuf> {
    let raw = Path::new(file.strip_prefix("file://").unwrap_or(file));
    let expanded = home_expand(raw)?;
    let resolved = if expanded.is_absolute() {
        expanded
    } else {
        profile_dir.join(expanded)
    };
    trace!(file, resolved = %resolved.display(), "Resolved icon file");
    Ok(resolved)
}

/// Turn a local path into the `file://` form stored in icon documents.
pub fn to_file_uri(path: &Path) -> Result<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(format!("file://{}", absolute.display()))
}

/// Parse a folder path such as `3/5` into key positions.
///
/// The empty string means the root page.
pub fn parse_page_path(path: &str) -> Result<Vec<u8>> {
    path.split('/')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.trim()
                .parse::<u8>()
                .map_err(|_| DeckError::Other(format!("Invalid page path segment '{part}'")))
        })
        .collect()
}
