//! Error types for deck binding operations.
//!
//! Only recoverable, user-facing failures travel through [`DeckError`].
//! Contract violations inside the model (stale handles, unbalanced
//! inhibit/uninhibit) are logged and turned into no-ops instead.

use thiserror::Error;

/// Primary error type for deck operations.
#[derive(Error, Debug)]
pub enum DeckError {
    // Profile errors
    #[error("Profile not found: {path}")]
    ProfileNotFound { path: String },

    #[error("Profile parse error: {0}")]
    ProfileParse(String),

    #[error("Unsupported profile format: {path}")]
    UnsupportedFormat { path: String },

    // Binding errors
    #[error("Invalid key index {index}: device has {max} keys (0-{max_idx})")]
    InvalidKeyIndex { index: u8, max: u8, max_idx: u8 },

    #[error("Unknown action kind: {kind}")]
    UnknownActionKind { kind: String },

    #[error("No folder at key {key} on the current page")]
    NotAFolder { key: u8 },

    #[error("Key {key} is the navigate-up slot of this folder")]
    ReservedKey { key: u8 },

    #[error("Invalid settings for '{kind}': {reason}")]
    InvalidSettings { kind: String, reason: String },

    #[error("Unknown preference '{key}' for '{kind}'")]
    UnknownPreference { kind: String, key: String },

    // Device errors
    #[error("Device communication error: {0}")]
    DeviceCommunication(String),

    // Icon errors
    #[error("Invalid color '{0}': expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    // Configuration errors
    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Unknown device model: {0}")]
    UnknownModel(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl DeckError {
    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ProfileNotFound { .. }
                | Self::UnsupportedFormat { .. }
                | Self::InvalidKeyIndex { .. }
                | Self::UnknownActionKind { .. }
                | Self::NotAFolder { .. }
                | Self::ReservedKey { .. }
                | Self::InvalidColor(_)
                | Self::UnknownModel(_)
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ProfileNotFound { .. } => Some("Run: deck init <profile>"),
            Self::UnsupportedFormat { .. } => Some("Use a .json, .yaml or .yml profile file"),
            Self::UnknownActionKind { .. } => Some("Run: deck kinds"),
            Self::NotAFolder { .. } => Some("Check --path: every step must be a folder key"),
            Self::ReservedKey { .. } => Some("Key 0 of a folder always navigates up"),
            Self::InvalidColor(_) => Some("Use a hex color such as #ff8800"),
            Self::UnknownModel(_) => Some("Valid models: mini, original, mk2, xl, plus, neo"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using DeckError.
pub type Result<T> = std::result::Result<T, DeckError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| DeckError::Other(format!("{}: {e}", f().into())))
    }
}
