//! Stand-in for bindings whose kind no factory knows.
//!
//! The placeholder does nothing when pressed but keeps the original kind id
//! and settings, and writes both back unchanged.

use crate::error::Result;
use crate::model::{Action, BuildContext, IconContents, PageEncoder, Settings};

pub const ICON: &str = "action-unavailable-symbolic";

#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    kind: String,
    settings: Settings,
}

impl Placeholder {
    #[must_use]
    pub fn new(kind: &str, settings: Settings) -> Self {
        Self {
            kind: kind.to_string(),
            settings,
        }
    }
}

impl Action for Placeholder {
    fn kind_id(&self) -> &str {
        &self.kind
    }

    fn display_name(&self) -> &str {
        "Unavailable action"
    }

    fn icon_contents(&self) -> IconContents {
        IconContents::named(ICON)
    }

    fn serialize_settings(&self, _pages: &dyn PageEncoder) -> Settings {
        self.settings.clone()
    }

    fn deserialize_settings(&mut self, settings: &Settings, _ctx: &mut BuildContext<'_>) -> Result<()> {
        self.settings = settings.clone();
        Ok(())
    }

    fn is_inert(&self) -> bool {
        true
    }
}
