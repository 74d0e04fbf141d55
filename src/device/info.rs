//! Device model table: key counts, layouts and icon sizes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DeckError;

/// Supported Stream Deck device models.
///
/// Only models with a key grid are listed; the Pedal has no display and
/// cannot carry icons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceModel {
    /// Stream Deck Mini (6 keys, 3x2)
    Mini,
    /// Stream Deck Original (15 keys, 5x3)
    Original,
    /// Stream Deck MK.2 (15 keys, 5x3)
    #[default]
    Mk2,
    /// Stream Deck XL (32 keys, 8x4)
    Xl,
    /// Stream Deck + (8 keys + LCD + dials)
    Plus,
    /// Stream Deck Neo (8 keys + touch strip)
    Neo,
}

impl DeviceModel {
    /// Every model, in the order they are listed to users.
    pub const ALL: [Self; 6] = [
        Self::Mini,
        Self::Original,
        Self::Mk2,
        Self::Xl,
        Self::Plus,
        Self::Neo,
    ];

    /// Returns the number of keys for this device model.
    #[must_use]
    pub const fn key_count(self) -> u8 {
        match self {
            Self::Mini => 6,
            Self::Original | Self::Mk2 => 15,
            Self::Xl => 32,
            Self::Plus | Self::Neo => 8,
        }
    }

    /// Returns the key icon dimensions (width, height) in pixels.
    #[must_use]
    pub const fn key_dimensions(self) -> (u32, u32) {
        match self {
            Self::Mini => (80, 80),
            Self::Original | Self::Mk2 | Self::Neo => (72, 72),
            Self::Xl => (96, 96),
            Self::Plus => (120, 120),
        }
    }

    /// Returns the key layout (columns, rows).
    #[must_use]
    pub const fn layout(self) -> (u8, u8) {
        match self {
            Self::Mini => (3, 2),
            Self::Original | Self::Mk2 => (5, 3),
            Self::Xl => (8, 4),
            Self::Plus | Self::Neo => (4, 2),
        }
    }

    /// Returns a human-readable name for this device model.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Mini => "Stream Deck Mini",
            Self::Original => "Stream Deck (Original)",
            Self::Mk2 => "Stream Deck MK.2",
            Self::Xl => "Stream Deck XL",
            Self::Plus => "Stream Deck +",
            Self::Neo => "Stream Deck Neo",
        }
    }

    const fn slug(self) -> &'static str {
        match self {
            Self::Mini => "mini",
            Self::Original => "original",
            Self::Mk2 => "mk2",
            Self::Xl => "xl",
            Self::Plus => "plus",
            Self::Neo => "neo",
        }
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for DeviceModel {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|model| model.slug() == wanted)
            .ok_or_else(|| DeckError::UnknownModel(s.to_string()))
    }
}
