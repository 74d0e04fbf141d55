//! Pages: stored bindings, realization and the folder tree.

use std::collections::BTreeMap;

use serde_json::Value;
use slotmap::SlotMap;
use tracing::{debug, instrument, trace, warn};

use super::action::{Action, BuildContext, PageEncoder, Settings};
use super::deck::Deck;
use super::icon::{Icon, IconContents};
use super::{ActionId, ButtonId, IconId, PageId};
use crate::actions::navigation;
use crate::actions::placeholder::Placeholder;
use crate::config::schema::{BindingDocument, IconDocument, PageDocument};

/// Settings key that carries a folder's child page.
pub(crate) const CHILD_PAGE_KEY: &str = "page";

/// Live objects a binding has been realized into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Realized {
    pub custom_icon: Option<IconId>,
    pub action: Option<ActionId>,
}

/// Stored state of one key position on a page.
#[derive(Debug, Default)]
pub struct Binding {
    pub(crate) kind: Option<String>,
    pub(crate) settings: Settings,
    pub(crate) custom_icon: Option<IconDocument>,
    /// Realized objects, kept so folder pages survive navigation.
    pub(crate) cache: Option<Realized>,
}

impl Binding {
    fn from_document(doc: &BindingDocument) -> Self {
        Self {
            kind: doc.kind.clone(),
            settings: doc.settings.clone(),
            custom_icon: doc.custom_icon.clone(),
            cache: None,
        }
    }

    fn go_up() -> Self {
        Self {
            kind: Some(navigation::KIND.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub const fn custom_icon(&self) -> Option<&IconDocument> {
        self.custom_icon.as_ref()
    }

    /// Whether the binding has been turned into live objects.
    #[must_use]
    pub const fn is_realized(&self) -> bool {
        self.cache.is_some()
    }

    fn is_navigation(&self) -> bool {
        self.kind.as_deref() == Some(navigation::KIND)
    }
}

/// A set of bindings keyed by position.
#[derive(Debug, Default)]
pub struct Page {
    pub(crate) parent: Option<PageId>,
    pub(crate) bindings: BTreeMap<u8, Binding>,
}

impl Page {
    #[must_use]
    pub const fn parent(&self) -> Option<PageId> {
        self.parent
    }

    #[must_use]
    pub fn binding(&self, position: u8) -> Option<&Binding> {
        self.bindings.get(&position)
    }

    pub fn bindings(&self) -> impl Iterator<Item = (u8, &Binding)> {
        self.bindings.iter().map(|(&position, binding)| (position, binding))
    }

    /// Subpages always start with a navigate-up binding. Anything already at
    /// position 0 is shifted one slot to make room. Bindings shifted off the
    /// key grid stay in the document; only a shift past `u8::MAX` drops one.
    fn ensure_go_up_first(&mut self) {
        if self.parent.is_none() || self.bindings.get(&0).is_some_and(Binding::is_navigation) {
            return;
        }

        if self.bindings.contains_key(&0) {
            let shifted = std::mem::take(&mut self.bindings);
            for (position, binding) in shifted {
                match position.checked_add(1) {
                    Some(next) => {
                        self.bindings.insert(next, binding);
                    }
                    None => warn!(position, "Dropping binding shifted past the last key"),
                }
            }
        }

        self.bindings.insert(0, Binding::go_up());
    }
}

/// Arena of every live page.
///
/// Parents are fixed when a page is inserted and must already exist, so
/// the parent chain of every page ends at a root.
#[derive(Debug, Default)]
pub struct PageTree {
    pages: SlotMap<PageId, Page>,
}

impl PageTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty page. A page with a parent gets its navigate-up
    /// binding immediately.
    pub fn insert_empty(&mut self, parent: Option<PageId>) -> PageId {
        self.insert(Page {
            parent: self.checked_parent(parent),
            bindings: BTreeMap::new(),
        })
    }

    /// Decode a page document. Child page documents are moved into the
    /// settings of their folder binding, to be instantiated when the folder
    /// action is realized.
    pub fn insert_document(&mut self, parent: Option<PageId>, doc: &PageDocument) -> PageId {
        let mut bindings = BTreeMap::new();

        for (&position, entry) in &doc.bindings {
            if entry.is_empty() {
                continue;
            }
            let mut binding = Binding::from_document(entry);
            if let Some(child) = doc.children.get(&position) {
                if binding.is_navigation() {
                    match serde_json::to_value(child) {
                        Ok(value) => {
                            binding.settings.insert(CHILD_PAGE_KEY.to_string(), value);
                        }
                        Err(err) => warn!(position, %err, "Failed to encode child page"),
                    }
                } else {
                    warn!(position, kind = ?binding.kind, "Ignoring child page of a non-folder binding");
                }
            }
            bindings.insert(position, binding);
        }

        for position in doc.children.keys() {
            if !doc.bindings.contains_key(position) {
                warn!(position, "Ignoring child page without a folder binding");
            }
        }

        self.insert(Page {
            parent: self.checked_parent(parent),
            bindings,
        })
    }

    fn checked_parent(&self, parent: Option<PageId>) -> Option<PageId> {
        parent.filter(|&p| {
            let exists = self.pages.contains_key(p);
            if !exists {
                warn!(?p, "Parent page does not exist, creating a root page instead");
            }
            exists
        })
    }

    fn insert(&mut self, mut page: Page) -> PageId {
        page.ensure_go_up_first();
        let id = self.pages.insert(page);
        trace!(?id, "Inserted page");
        id
    }

    #[must_use]
    pub fn get(&self, id: PageId) -> Option<&Page> {
        self.pages.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.pages.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: PageId) -> bool {
        self.pages.contains_key(id)
    }

    #[must_use]
    pub fn parent(&self, id: PageId) -> Option<PageId> {
        self.pages.get(id).and_then(|page| page.parent)
    }

    /// Number of ancestors between `id` and the root.
    #[must_use]
    pub fn depth(&self, id: PageId) -> usize {
        std::iter::successors(self.parent(id), |&p| self.parent(p)).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Remove a page that is no longer referenced, returning its bindings.
    /// Prefer [`Deck::discard_page`], which also releases realized objects.
    pub fn discard(&mut self, id: PageId) -> Option<Page> {
        self.pages.remove(id)
    }
}

impl Deck {
    /// Parent of `page`, or `None` for a root page or a stale handle.
    #[must_use]
    pub fn get_parent(&self, page: PageId) -> Option<PageId> {
        self.pages.parent(page)
    }

    /// Capture the button's current action and custom icon into the binding
    /// at its position on `page`.
    pub fn update_item_from_button(&mut self, page: PageId, button: ButtonId) {
        let Some(slot) = self.buttons.get(button) else {
            warn!(?button, "update_item_from_button on a stale button");
            return;
        };
        let (position, action, custom_icon) = (slot.position, slot.action, slot.custom_icon);

        if !self.pages.contains(page) {
            warn!(?page, "update_item_from_button on a stale page");
            return;
        }

        let captured = if action.is_none() && custom_icon.is_none() {
            None
        } else {
            let behavior = action.and_then(|a| self.actions.get(a)).map(|s| &s.behavior);
            Some(Binding {
                kind: behavior.map(|b| b.kind_id().to_string()),
                settings: behavior
                    .map(|b| b.serialize_settings(&*self))
                    .unwrap_or_default(),
                custom_icon: custom_icon.and_then(|i| self.icons.get(i)).map(Icon::to_document),
                cache: Some(Realized {
                    custom_icon,
                    action,
                }),
            })
        };

        if let Some(cache) = captured.as_ref().and_then(|b| b.cache) {
            self.hold_realized(cache);
        }

        let previous = self.pages.get_mut(page).and_then(|p| match captured {
            Some(binding) => p.bindings.insert(position, binding),
            None => p.bindings.remove(&position),
        });

        if let Some(cache) = previous.and_then(|b| b.cache) {
            self.release_realized(cache);
        }

        trace!(?page, position, "Captured button into page");
    }

    /// Realize every key of `page` onto the live buttons. Used when a page
    /// becomes active; persistence is inhibited while the buttons change.
    #[instrument(skip(self))]
    pub fn update_all_items(&mut self, page: PageId) {
        let grid = self.grid.clone();
        for button in grid {
            let realized = self.realize(page, button);

            self.inhibit(button);
            self.set_action(button, realized.action);
            self.set_custom_icon(button, realized.custom_icon);
            self.uninhibit(button);
        }
    }

    /// Turn the binding for `button`'s position on `page` into live objects.
    ///
    /// Realized objects are cached in the binding and reused on the next
    /// call. An unknown kind yields an inert placeholder.
    pub fn realize(&mut self, page: PageId, button: ButtonId) -> Realized {
        let Some(position) = self.buttons.get(button).map(|b| b.position) else {
            warn!(?button, "realize on a stale button");
            return Realized::default();
        };

        let Some(binding) = self.pages.get(page).and_then(|p| p.bindings.get(&position)) else {
            return Realized::default();
        };

        if let Some(cache) = binding.cache {
            return cache;
        }

        let kind = binding.kind.clone();
        let settings = binding.settings.clone();
        let icon_doc = binding.custom_icon.clone();

        let action = kind.map(|kind| self.instantiate(&kind, position, page, &settings));
        let custom_icon = icon_doc.map(|doc| self.create_icon(IconContents::from(&doc)));
        let realized = Realized {
            custom_icon,
            action,
        };

        self.hold_realized(realized);
        if let Some(binding) = self
            .pages
            .get_mut(page)
            .and_then(|p| p.bindings.get_mut(&position))
        {
            binding.cache = Some(realized);
        }

        debug!(?page, position, ?action, "Realized binding");
        realized
    }

    /// Build an action for a stored binding, falling back to a placeholder
    /// for kinds no factory knows.
    pub(crate) fn instantiate(
        &mut self,
        kind: &str,
        position: u8,
        page: PageId,
        settings: &Settings,
    ) -> ActionId {
        let mut ctx = BuildContext {
            position,
            active_page: page,
            icon_size: self.icon_size,
            pages: &mut self.pages,
        };

        let behavior: Box<dyn Action> = match self.factory.create(kind, &mut ctx) {
            Some(mut behavior) => {
                if let Err(err) = behavior.deserialize_settings(settings, &mut ctx) {
                    warn!(kind, position, %err, "Failed to restore action settings, using defaults");
                }
                behavior
            }
            None => {
                warn!(kind, position, "Unknown action kind, keeping binding as placeholder");
                Box::new(Placeholder::new(kind, settings.clone()))
            }
        };

        self.insert_action(behavior)
    }

    /// Encode `page` and its folder subtree.
    #[must_use]
    pub fn page_to_document(&self, page: PageId) -> PageDocument {
        self.encode_page(page)
    }

    /// Decode a page tree under `parent`. The new page is not attached to
    /// any folder binding.
    pub fn page_from_document(&mut self, parent: Option<PageId>, doc: &PageDocument) -> PageId {
        self.pages.insert_document(parent, doc)
    }

    /// Remove a page and release everything its bindings realized. Folder
    /// actions released here take their own pages with them.
    pub fn discard_page(&mut self, page: PageId) {
        if self.active_pages.contains(&page) {
            warn!(?page, "Refusing to discard a page on the active stack");
            return;
        }
        let Some(removed) = self.pages.discard(page) else {
            return;
        };
        for binding in removed.bindings.into_values() {
            if let Some(cache) = binding.cache {
                self.release_realized(cache);
            }
        }
        trace!(?page, "Discarded page");
    }

    fn hold_realized(&mut self, realized: Realized) {
        if let Some(icon) = realized.custom_icon {
            self.hold_icon(icon);
        }
        if let Some(action) = realized.action {
            self.hold_action(action);
        }
    }

    fn release_realized(&mut self, realized: Realized) {
        if let Some(icon) = realized.custom_icon {
            self.release_icon(icon);
        }
        if let Some(action) = realized.action {
            self.release_action(action);
        }
    }

    fn binding_document(&self, binding: &Binding) -> BindingDocument {
        let Some(cache) = binding.cache else {
            return BindingDocument {
                kind: binding.kind.clone(),
                settings: binding.settings.clone(),
                custom_icon: binding.custom_icon.clone(),
            };
        };

        let behavior = cache
            .action
            .and_then(|a| self.actions.get(a))
            .map(|slot| &slot.behavior);

        BindingDocument {
            kind: behavior.map(|b| b.kind_id().to_string()),
            settings: behavior
                .map(|b| b.serialize_settings(&*self))
                .unwrap_or_default(),
            custom_icon: cache
                .custom_icon
                .and_then(|i| self.icons.get(i))
                .map(Icon::to_document),
        }
    }
}

impl PageEncoder for Deck {
    fn encode_page(&self, page: PageId) -> PageDocument {
        let mut doc = PageDocument::default();
        let Some(live) = self.pages.get(page) else {
            warn!(?page, "Encoding a stale page");
            return doc;
        };

        for (&position, binding) in &live.bindings {
            let mut entry = self.binding_document(binding);

            if entry.kind.as_deref() == Some(navigation::KIND) {
                if let Some(value) = entry.settings.remove(CHILD_PAGE_KEY) {
                    match serde_json::from_value::<PageDocument>(value.clone()) {
                        Ok(child) => {
                            doc.children.insert(position, child);
                        }
                        Err(err) => {
                            warn!(position, %err, "Folder settings hold an invalid page");
                            entry.settings.insert(CHILD_PAGE_KEY.to_string(), value);
                        }
                    }
                }
            }

            if !entry.is_empty() {
                doc.bindings.insert(position, entry);
            }
        }

        doc
    }
}

/// Read a child page document out of folder settings.
pub(crate) fn child_page_document(settings: &Settings) -> Option<serde_json::Result<PageDocument>> {
    settings
        .get(CHILD_PAGE_KEY)
        .filter(|value| !value.is_null())
        .map(|value| serde_json::from_value::<PageDocument>(Value::clone(value)))
}
