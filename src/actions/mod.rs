//! Action factories and the built-in actions.
//!
//! A factory turns a stored kind id into a live [`Action`]. Unknown kinds
//! are answered with `None`; the deck substitutes a [`placeholder`] so the
//! binding survives until a factory for it shows up again.

pub mod brightness;
pub mod navigation;
pub mod placeholder;

use serde::Serialize;
use tracing::trace;

use crate::model::{Action, BuildContext};

/// Catalog entry describing one action kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionInfo {
    pub id: String,
    pub icon_name: String,
    pub display_name: String,
}

impl ActionInfo {
    fn new(id: &str, icon_name: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            icon_name: icon_name.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

/// Creates actions from stored kind ids.
pub trait ActionFactory {
    /// Kinds this factory can create.
    fn list_kinds(&self) -> Vec<ActionInfo>;

    /// Create a default-configured action, or `None` for an unknown kind.
    fn create(&self, kind: &str, ctx: &mut BuildContext<'_>) -> Option<Box<dyn Action>>;
}

/// The actions that ship with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinActions;

impl ActionFactory for BuiltinActions {
    fn list_kinds(&self) -> Vec<ActionInfo> {
        vec![
            ActionInfo::new(navigation::KIND, navigation::FOLDER_ICON, "Folder"),
            ActionInfo::new(brightness::KIND, brightness::SET_ICON, "Brightness"),
        ]
    }

    fn create(&self, kind: &str, ctx: &mut BuildContext<'_>) -> Option<Box<dyn Action>> {
        match kind {
            navigation::KIND => Some(Box::new(navigation::Navigation::new(ctx))),
            brightness::KIND => Some(Box::new(brightness::Brightness::default())),
            _ => None,
        }
    }
}

/// Several factories behind one. The first factory that knows a kind wins.
#[derive(Default)]
pub struct ActionRegistry {
    factories: Vec<Box<dyn ActionFactory>>,
}

impl ActionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding only [`BuiltinActions`].
    #[must_use]
    pub fn with_builtin() -> Self {
        Self::new().register(BuiltinActions)
    }

    #[must_use]
    pub fn register(mut self, factory: impl ActionFactory + 'static) -> Self {
        self.factories.push(Box::new(factory));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl ActionFactory for ActionRegistry {
    fn list_kinds(&self) -> Vec<ActionInfo> {
        let mut kinds: Vec<ActionInfo> = Vec::new();
        for info in self.factories.iter().flat_map(|f| f.list_kinds()) {
            if !kinds.iter().any(|known| known.id == info.id) {
                kinds.push(info);
            }
        }
        kinds
    }

    fn create(&self, kind: &str, ctx: &mut BuildContext<'_>) -> Option<Box<dyn Action>> {
        let created = self.factories.iter().find_map(|f| f.create(kind, ctx));
        trace!(kind, found = created.is_some(), "Registry lookup");
        created
    }
}
