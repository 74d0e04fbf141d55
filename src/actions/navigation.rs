//! Folder navigation.
//!
//! The action comes in two variants, picked once when it is built: keys
//! other than 0 (and key 0 on the root page) open a folder, key 0 of a
//! subpage goes back up. A folder owns its child page and serializes it,
//! with all descendants, into its settings.

use serde_json::Value;
use tracing::debug;

use crate::error::{DeckError, Result};
use crate::model::page::child_page_document;
use crate::model::{
    Action, ActivationContext, BuildContext, DeckCommand, IconContents, PageEncoder, PageId,
    Settings,
};

pub const KIND: &str = "navigation";
pub const FOLDER_ICON: &str = "folder-symbolic";
pub const GO_UP_ICON: &str = "go-up-symbolic";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    EnterFolder { page: PageId },
    GoUp,
}

#[derive(Debug)]
pub struct Navigation {
    variant: Variant,
}

impl Navigation {
    /// Build for the key described by `ctx`. A folder gets a fresh empty
    /// child page of the active page.
    pub fn new(ctx: &mut BuildContext<'_>) -> Self {
        let variant = if ctx.position != 0 || ctx.active_page_is_root() {
            Variant::EnterFolder {
                page: ctx.pages.insert_empty(Some(ctx.active_page)),
            }
        } else {
            Variant::GoUp
        };
        debug!(position = ctx.position, ?variant, "Created navigation action");
        Self { variant }
    }

    #[must_use]
    pub const fn is_go_up(&self) -> bool {
        matches!(self.variant, Variant::GoUp)
    }
}

impl Action for Navigation {
    fn kind_id(&self) -> &str {
        KIND
    }

    fn display_name(&self) -> &str {
        match self.variant {
            Variant::EnterFolder { .. } => "Folder",
            Variant::GoUp => "Go Up",
        }
    }

    fn icon_contents(&self) -> IconContents {
        match self.variant {
            Variant::EnterFolder { .. } => IconContents::named(FOLDER_ICON),
            Variant::GoUp => IconContents::named(GO_UP_ICON),
        }
    }

    fn activate(&mut self, _ctx: &ActivationContext) -> Option<DeckCommand> {
        Some(match self.variant {
            Variant::EnterFolder { page } => DeckCommand::PushPage(page),
            Variant::GoUp => DeckCommand::PopPage,
        })
    }

    fn serialize_settings(&self, pages: &dyn PageEncoder) -> Settings {
        let mut settings = Settings::new();
        if let Variant::EnterFolder { page } = self.variant {
            if let Ok(value) = serde_json::to_value(pages.encode_page(page)) {
                settings.insert("page".to_string(), value);
            }
        }
        settings
    }

    /// Replace the empty child page with the stored one.
    fn deserialize_settings(&mut self, settings: &Settings, ctx: &mut BuildContext<'_>) -> Result<()> {
        let Variant::EnterFolder { page } = self.variant else {
            return Ok(());
        };
        let Some(doc) = child_page_document(settings) else {
            return Ok(());
        };
        let doc = doc.map_err(|err| DeckError::InvalidSettings {
            kind: KIND.to_string(),
            reason: err.to_string(),
        })?;

        let parent = ctx.pages.parent(page).unwrap_or(ctx.active_page);
        let restored = ctx.pages.insert_document(Some(parent), &doc);
        // The replaced page was created with the action and never realized.
        ctx.pages.discard(page);
        self.variant = Variant::EnterFolder { page: restored };
        Ok(())
    }

    fn owned_page(&self) -> Option<PageId> {
        match self.variant {
            Variant::EnterFolder { page } => Some(page),
            Variant::GoUp => None,
        }
    }
}

/// Whether stored settings carry a child page.
#[must_use]
pub fn has_child_page(settings: &Settings) -> bool {
    settings.get("page").is_some_and(Value::is_object)
}
