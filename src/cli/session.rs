//! One command-line edit of a profile file.
//!
//! A session loads the profile into a [`Deck`], enters the requested folder
//! path, lets the command mutate keys and writes the profile back if the
//! deck asked for a save.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::{self, DeckSettings};
use crate::error::{DeckError, Result};
use crate::model::{
    ActionId, ButtonId, Deck, DeckBuilder, IconContents, PreferenceControl, PreferenceValue,
    PreferencesSurface,
};
use crate::persistence::DebouncedSave;

/// What a key currently shows, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyView {
    pub position: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Enters a folder when pressed.
    pub folder: bool,
    /// Navigate-up key of a folder; cannot be moved or unbound.
    pub reserved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<PreferencesSurface>,
}

/// A loaded profile, positioned on one page.
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    deck: Deck,
    save_delay: Duration,
    folders: Vec<u8>,
}

impl Session {
    /// Load `path` and build a deck for it from the settings.
    #[instrument(skip(settings))]
    pub fn open(path: &Path, settings: &DeckSettings) -> Result<Self> {
        let builder = Deck::builder(settings.model)
            .persistence(DebouncedSave::new(settings.save_delay()));
        Self::open_with(path, builder, settings.save_delay())
    }

    /// Load `path` with a caller-configured builder.
    pub fn open_with(path: &Path, builder: DeckBuilder, save_delay: Duration) -> Result<Self> {
        let profile = config::load_profile(path)?;
        let deck = builder.build(&profile);
        Ok(Self {
            path: path.to_path_buf(),
            deck,
            save_delay,
            folders: Vec::new(),
        })
    }

    /// Enter each folder key in turn, starting from the root.
    pub fn enter(&mut self, folders: &[u8]) -> Result<()> {
        for &position in folders {
            let button = self.deck.key(position)?;
            let page = self
                .bound_action(button)
                .and_then(|a| self.deck.action(a))
                .and_then(|a| a.owned_page())
                .ok_or(DeckError::NotAFolder { key: position })?;
            if !self.deck.push_page(page) {
                return Err(DeckError::NotAFolder { key: position });
            }
            self.folders.push(position);
        }
        debug!(folders = ?self.folders, "Entered page");
        Ok(())
    }

    #[must_use]
    pub const fn deck(&self) -> &Deck {
        &self.deck
    }

    pub const fn deck_mut(&mut self) -> &mut Deck {
        &mut self.deck
    }

    #[must_use]
    pub fn folders(&self) -> &[u8] {
        &self.folders
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A key that may be edited: not the navigate-up slot.
    pub fn editable_key(&self, position: u8) -> Result<ButtonId> {
        let button = self.deck.key(position)?;
        if self.deck.is_navigate_up_slot(button) {
            return Err(DeckError::ReservedKey { key: position });
        }
        Ok(button)
    }

    pub fn bind(&mut self, position: u8, kind: &str) -> Result<()> {
        let button = self.editable_key(position)?;
        let action = self.deck.create_action(kind, position)?;
        self.deck.set_action(button, Some(action));
        info!(position, kind, "Bound action");
        Ok(())
    }

    pub fn unbind(&mut self, position: u8) -> Result<()> {
        let button = self.editable_key(position)?;
        let deck = &mut self.deck;
        deck.inhibit(button);
        deck.set_action(button, None);
        deck.set_custom_icon(button, None);
        deck.uninhibit(button);
        deck.persist(button);
        info!(position, "Unbound key");
        Ok(())
    }

    pub fn swap(&mut self, from: u8, to: u8) -> Result<()> {
        let dragged = self.deck.key(from)?;
        let dropped = self.deck.key(to)?;
        if self.deck.is_navigate_up_slot(dragged) {
            return Err(DeckError::ReservedKey { key: from });
        }
        if self.deck.is_navigate_up_slot(dropped) {
            return Err(DeckError::ReservedKey { key: to });
        }
        if !self.deck.swap_buttons(dragged, dropped) {
            return Err(DeckError::Other(format!("Keys {from} and {to} cannot be swapped")));
        }
        Ok(())
    }

    /// Replace the key's custom icon; `None` removes it.
    pub fn set_icon(&mut self, position: u8, contents: Option<IconContents>) -> Result<()> {
        let button = self.deck.key(position)?;
        let icon = contents.map(|c| self.deck.create_icon(c));
        self.deck.set_custom_icon(button, icon);
        Ok(())
    }

    /// Write one preference of the bound action. The control type decides
    /// how `value` is read.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_preference(&mut self, position: u8, name: &str, value: f64) -> Result<()> {
        let button = self.deck.key(position)?;
        let action = self.bound_action(button).ok_or_else(|| {
            DeckError::Other(format!("Key {position} has no action"))
        })?;
        let behavior = self
            .deck
            .action(action)
            .ok_or_else(|| DeckError::Other(format!("Key {position} has no action")))?;
        let control = behavior
            .preferences()
            .and_then(|s| s.fields.into_iter().find(|f| f.key == name))
            .map(|f| f.control)
            .ok_or_else(|| DeckError::UnknownPreference {
                kind: behavior.kind_id().to_string(),
                key: name.to_string(),
            })?;

        let value = match control {
            PreferenceControl::Choice { .. } if value >= 0.0 => {
                PreferenceValue::Choice(value.round() as usize)
            }
            PreferenceControl::Choice { .. } => {
                return Err(DeckError::InvalidSettings {
                    kind: behavior.kind_id().to_string(),
                    reason: format!("'{name}' needs a non-negative index"),
                });
            }
            PreferenceControl::Range { .. } => PreferenceValue::Number(value),
        };
        self.deck.set_action_preference(action, name, &value)
    }

    /// Press and release a key.
    pub fn press(&mut self, position: u8) -> Result<()> {
        let button = self.deck.key(position)?;
        self.deck.set_pressed(button, true);
        self.deck.set_pressed(button, false);
        Ok(())
    }

    /// Every key of the active page.
    #[must_use]
    pub fn keys(&self) -> Vec<KeyView> {
        key_views(&self.deck)
    }

    /// Write the profile if a save is pending. Returns whether it wrote.
    ///
    /// A command finishes well inside the debounce window, so the pending
    /// save is flushed here instead of waiting for it.
    pub fn finish(mut self) -> Result<bool> {
        let due = Instant::now() + self.save_delay;
        match self.deck.poll_save(due) {
            Some(profile) => {
                config::save_profile(&profile, &self.path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Hand the deck over, e.g. to drop it and close its device.
    #[must_use]
    pub fn into_deck(self) -> Deck {
        self.deck
    }

    fn bound_action(&self, button: ButtonId) -> Option<ActionId> {
        self.deck.button(button).and_then(|b| b.action())
    }
}

/// Describe every key of the deck's active page.
#[must_use]
pub fn key_views(deck: &Deck) -> Vec<KeyView> {
    deck.buttons()
        .iter()
        .filter_map(|&button| {
            let slot = deck.button(button)?;
            let behavior = slot.action().and_then(|a| deck.action(a));
            let composed = deck.composed_icon(button)?;
            Some(KeyView {
                position: slot.position(),
                kind: behavior.map(|a| a.kind_id().to_string()),
                name: behavior.map(|a| a.display_name().to_string()),
                icon_name: composed.icon_name,
                text: composed.text,
                folder: behavior.and_then(|a| a.owned_page()).is_some(),
                reserved: deck.is_navigate_up_slot(button),
                preferences: behavior.and_then(|a| a.preferences()),
            })
        })
        .collect()
}
