//! Button binding model.
//!
//! Everything lives in generational arenas owned by the [`Deck`] aggregate:
//! icons, actions, buttons and pages are addressed by copyable handles, and
//! every back reference (action to button, page to parent) is a handle
//! rather than a pointer. A stale handle simply fails to resolve.
//!
//! # Modules
//!
//! - `icon`: renderable icon values and compositing
//! - `action`: the capability trait implemented by every bound behavior
//! - `button`: icon resolution and press handling for a single key
//! - `page`: bindings, realization and the folder tree
//! - `deck`: the device aggregate and active-page stack
//! - `swap`: drag-and-drop exchange of two buttons

pub mod action;
pub mod button;
pub mod deck;
pub mod icon;
pub mod page;
pub mod swap;

use slotmap::new_key_type;

new_key_type! {
    /// Handle to an [`icon::Icon`] in the deck arena.
    pub struct IconId;
    /// Handle to a bound or cached action.
    pub struct ActionId;
    /// Handle to one physical key slot.
    pub struct ButtonId;
    /// Handle to a page in the folder tree.
    pub struct PageId;
}

pub use action::{
    Action, ActivationContext, BuildContext, DeckCommand, PageEncoder, PreferenceControl,
    PreferenceField, PreferenceValue, PreferencesSurface, Settings,
};
pub use button::Button;
pub use deck::{Deck, DeckBuilder, DeckEvent};
pub use icon::{ComposedIcon, Icon, IconContents, IconSize, Rgba};
pub use page::{Binding, Page, PageTree, Realized};
