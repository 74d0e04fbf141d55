//! The capability set every bound behavior implements.
//!
//! Actions never touch the deck directly. Activation returns a
//! [`DeckCommand`] that the deck applies after the action has run, and
//! settings (de)serialization gets the page tree passed in explicitly.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::PageId;
use super::icon::{IconContents, IconSize};
use super::page::PageTree;
use crate::config::schema::PageDocument;
use crate::error::{DeckError, Result};

/// Opaque settings object stored in a binding.
pub type Settings = serde_json::Map<String, Value>;

/// Side effect requested by an action on activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckCommand {
    /// Make this page the active page. Its parent must be the current one.
    PushPage(PageId),
    /// Return to the parent of the active page.
    PopPage,
    /// Set the display brightness, in percent.
    SetBrightness(u8),
}

/// What an action sees when its key goes down or up.
#[derive(Debug, Clone, Copy)]
pub struct ActivationContext {
    pub position: u8,
    pub active_page: PageId,
    pub brightness: u8,
}

/// Construction context handed to factories and to `deserialize_settings`.
pub struct BuildContext<'a> {
    /// Position of the button the action is being built for.
    pub position: u8,
    pub active_page: PageId,
    pub icon_size: IconSize,
    /// Actions that own pages (folders) create them here.
    pub pages: &'a mut PageTree,
}

impl BuildContext<'_> {
    /// Whether the active page is the root of the tree.
    #[must_use]
    pub fn active_page_is_root(&self) -> bool {
        self.pages.parent(self.active_page).is_none()
    }
}

impl fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("position", &self.position)
            .field("active_page", &self.active_page)
            .field("icon_size", &self.icon_size)
            .finish_non_exhaustive()
    }
}

/// Encodes a live page (including cached actions) into its document form.
pub trait PageEncoder {
    fn encode_page(&self, page: PageId) -> PageDocument;
}

/// A headless preferences surface: typed fields a front end can render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferencesSurface {
    pub title: String,
    pub fields: Vec<PreferenceField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceField {
    pub key: String,
    pub label: String,
    pub control: PreferenceControl,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PreferenceControl {
    Choice { options: Vec<String>, selected: usize },
    Range { min: f64, max: f64, step: f64, value: f64 },
}

/// A value written back through a preferences surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreferenceValue {
    Choice(usize),
    Number(f64),
}

/// Behavior bound to a button.
///
/// Only identification, the desired icon and settings handling are
/// required. Everything else has an inert default.
pub trait Action: fmt::Debug {
    /// Stable identifier of the action kind, as stored in bindings.
    fn kind_id(&self) -> &str;

    fn display_name(&self) -> &str;

    /// Contents the action wants its icon to show right now.
    fn icon_contents(&self) -> IconContents;

    /// Key pressed.
    fn activate(&mut self, _ctx: &ActivationContext) -> Option<DeckCommand> {
        None
    }

    /// Key released.
    fn deactivate(&mut self, _ctx: &ActivationContext) -> Option<DeckCommand> {
        None
    }

    fn preferences(&self) -> Option<PreferencesSurface> {
        None
    }

    /// Apply one edit made through the preferences surface.
    fn set_preference(&mut self, key: &str, _value: &PreferenceValue) -> Result<()> {
        Err(DeckError::UnknownPreference {
            kind: self.kind_id().to_string(),
            key: key.to_string(),
        })
    }

    fn serialize_settings(&self, pages: &dyn PageEncoder) -> Settings;

    /// Restore state from stored settings. On error the action keeps its
    /// defaults.
    fn deserialize_settings(&mut self, settings: &Settings, ctx: &mut BuildContext<'_>)
    -> Result<()>;

    /// Page owned by this action. It is discarded with the action.
    fn owned_page(&self) -> Option<PageId> {
        None
    }

    /// True for stand-ins that cannot do anything.
    fn is_inert(&self) -> bool {
        false
    }
}
