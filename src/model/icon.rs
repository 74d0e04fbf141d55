//! Icon values and compositing.
//!
//! An [`Icon`] is a mutable renderable value. It may point at a *relative*
//! icon: when composed, layers the icon does not set itself (image, text,
//! opacity) fall back to the relative one. Buttons use this to draw a
//! custom icon on top of the icon of their bound action.

use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{trace, warn};

use super::{ButtonId, IconId};
use crate::config::schema::IconDocument;
use crate::error::{DeckError, Result};

/// An RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB`, `#RRGGBBAA` (leading `#` optional) or a named color.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::InvalidColor`] for anything else.
    pub fn parse(input: &str) -> Result<Self> {
        let hex = input.trim().trim_start_matches('#');

        if let Some(named) = named_color(hex) {
            return Ok(named);
        }

        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                .ok_or_else(|| DeckError::InvalidColor(input.to_string()))
        };

        match hex.len() {
            6 => Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
            8 => Ok(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(DeckError::InvalidColor(input.to_string())),
        }
    }

    /// Lowercase `#rrggbbaa` form used in documents.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

fn named_color(name: &str) -> Option<Rgba> {
    let rgba = match name.to_lowercase().as_str() {
        "transparent" => Rgba::TRANSPARENT,
        "black" => Rgba::BLACK,
        "white" => Rgba::WHITE,
        "red" => Rgba::new(255, 0, 0, 255),
        "green" => Rgba::new(0, 255, 0, 255),
        "blue" => Rgba::new(0, 0, 255, 255),
        "yellow" => Rgba::new(255, 255, 0, 255),
        "orange" => Rgba::new(255, 165, 0, 255),
        "purple" => Rgba::new(128, 0, 128, 255),
        "gray" | "grey" => Rgba::new(128, 128, 128, 255),
        _ => return None,
    };
    Some(rgba)
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Rgba {
    type Error = DeckError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Rgba> for String {
    fn from(value: Rgba) -> Self {
        value.to_hex()
    }
}

/// Pixel size an icon is rendered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IconSize {
    pub width: u32,
    pub height: u32,
}

impl IconSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// The drawable layers of an icon.
#[derive(Debug, Clone, PartialEq)]
pub struct IconContents {
    pub background: Rgba,
    /// Foreground color for symbolic glyphs and text; white when unset.
    pub color: Option<Rgba>,
    pub icon_name: Option<String>,
    pub text: Option<String>,
    /// URI of an image file. Loading it is the renderer's business.
    pub file: Option<String>,
    /// Inline encoded image bytes.
    pub data: Option<Vec<u8>>,
    /// `None` inherits the relative icon's opacity.
    pub opacity: Option<f32>,
}

impl Default for IconContents {
    fn default() -> Self {
        Self {
            background: Rgba::TRANSPARENT,
            color: None,
            icon_name: None,
            text: None,
            file: None,
            data: None,
            opacity: None,
        }
    }
}

impl IconContents {
    /// A symbolic glyph on a transparent background.
    #[must_use]
    pub fn named(icon_name: &str) -> Self {
        Self {
            icon_name: Some(icon_name.to_string()),
            ..Self::default()
        }
    }

    fn has_image(&self) -> bool {
        self.icon_name.is_some() || self.file.is_some() || self.data.is_some()
    }

    /// Whether the opacity is in range. Out-of-range values are rejected by
    /// the deck as contract violations.
    #[must_use]
    pub fn opacity_is_valid(&self) -> bool {
        self.opacity.is_none_or(|o| (0.0..=1.0).contains(&o))
    }
}

impl From<&IconDocument> for IconContents {
    fn from(doc: &IconDocument) -> Self {
        Self {
            background: doc.background_color,
            color: doc.color,
            icon_name: doc.icon_name.clone(),
            text: doc.text.clone(),
            file: doc.file.clone(),
            data: doc.data.clone(),
            opacity: doc.opacity,
        }
    }
}

impl From<&IconContents> for IconDocument {
    fn from(contents: &IconContents) -> Self {
        Self {
            background_color: contents.background,
            color: contents.color,
            icon_name: contents.icon_name.clone(),
            text: contents.text.clone(),
            file: contents.file.clone(),
            data: contents.data.clone(),
            opacity: contents.opacity,
        }
    }
}

/// An icon stored in the deck arena.
#[derive(Debug)]
pub struct Icon {
    pub(crate) contents: IconContents,
    pub(crate) size: IconSize,
    pub(crate) relative: Option<IconId>,
    /// The one button whose handlers run when this icon changes.
    pub(crate) subscriber: Option<ButtonId>,
    /// Button slots, binding caches and temporary holds keeping it alive.
    pub(crate) holders: u32,
}

impl Icon {
    #[must_use]
    pub(crate) const fn new(contents: IconContents, size: IconSize) -> Self {
        Self {
            contents,
            size,
            relative: None,
            subscriber: None,
            holders: 0,
        }
    }

    #[must_use]
    pub const fn contents(&self) -> &IconContents {
        &self.contents
    }

    #[must_use]
    pub const fn size(&self) -> IconSize {
        self.size
    }

    /// The icon this one is composed on top of.
    #[must_use]
    pub const fn relative(&self) -> Option<IconId> {
        self.relative
    }

    #[must_use]
    pub const fn subscriber(&self) -> Option<ButtonId> {
        self.subscriber
    }

    #[must_use]
    pub fn to_document(&self) -> IconDocument {
        IconDocument::from(&self.contents)
    }
}

/// An icon with its relative fallbacks resolved, ready to rasterize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedIcon {
    pub width: u32,
    pub height: u32,
    pub background: Rgba,
    pub color: Rgba,
    pub icon_name: Option<String>,
    pub text: Option<String>,
    pub file: Option<String>,
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
    pub opacity: f32,
}

impl ComposedIcon {
    /// What an unbound key shows.
    #[must_use]
    pub const fn blank(size: IconSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
            background: Rgba::BLACK,
            color: Rgba::WHITE,
            icon_name: None,
            text: None,
            file: None,
            data: None,
            opacity: 1.0,
        }
    }

    /// Resolve `id` against its relative icon.
    ///
    /// The background always comes from the icon itself. The image layer
    /// (icon name, file, inline data) and the text layer each fall back to
    /// the relative icon when unset, as does the opacity.
    pub fn compose(icons: &SlotMap<IconId, Icon>, id: IconId) -> Option<Self> {
        let icon = icons.get(id)?;
        let own = &icon.contents;
        let base = icon
            .relative
            .and_then(|rel| icons.get(rel))
            .map(|rel| &rel.contents);

        let image = if own.has_image() {
            Some(own)
        } else {
            base.filter(|b| b.has_image())
        };

        let text = own
            .text
            .clone()
            .or_else(|| base.and_then(|b| b.text.clone()));

        let opacity = own
            .opacity
            .or_else(|| base.and_then(|b| b.opacity))
            .unwrap_or(1.0);

        trace!(?id, relative = ?icon.relative, "Composing icon");

        Some(Self {
            width: icon.size.width,
            height: icon.size.height,
            background: own.background,
            color: own
                .color
                .or_else(|| base.and_then(|b| b.color))
                .unwrap_or(Rgba::WHITE),
            icon_name: image.and_then(|c| c.icon_name.clone()),
            text,
            file: image.and_then(|c| c.file.clone()),
            data: image.and_then(|c| c.data.clone()),
            opacity: if (0.0..=1.0).contains(&opacity) {
                opacity
            } else {
                warn!(opacity, "Clamping out-of-range icon opacity");
                opacity.clamp(0.0, 1.0)
            },
        })
    }
}
