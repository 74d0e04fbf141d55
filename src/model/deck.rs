//! The device aggregate.
//!
//! [`Deck`] owns every arena, the key grid and the active-page stack, and
//! talks to the three collaborators: the action factory, the device sink and
//! the persistence scheduler. Change notifications go out on a broadcast
//! channel; nobody is required to listen.

use std::fmt;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use slotmap::SlotMap;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

use super::action::{Action, DeckCommand};
use super::button::Button;
use super::icon::{Icon, IconContents, IconSize};
use super::page::PageTree;
use super::{ActionId, ButtonId, IconId, PageId};
use crate::actions::{ActionFactory, ActionInfo, BuiltinActions};
use crate::config::schema::ProfileDocument;
use crate::device::{DeviceModel, DeviceSink, OfflineDevice};
use crate::error::{DeckError, Result};
use crate::persistence::{DebouncedSave, Persistence};

/// Default capacity of the event channel.
const EVENT_CAPACITY: usize = 256;

/// Change notifications published by the deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeckEvent {
    /// The button's action or custom icon was replaced.
    ButtonChanged { position: u8 },
    /// An icon the button displays changed its contents.
    IconChanged { position: u8 },
    Pressed { position: u8, pressed: bool },
    /// The active page changed; `depth` is 0 for the root.
    ActivePageChanged { depth: usize },
    BrightnessChanged { brightness: u8 },
}

/// Arena entry for an action.
pub(crate) struct ActionSlot {
    pub(crate) behavior: Box<dyn Action>,
    /// Icon owned by the action.
    pub(crate) icon: IconId,
    /// Button the action is bound to. Also its only subscriber.
    pub(crate) owner: Option<ButtonId>,
    pub(crate) holders: u32,
}

/// Builder for [`Deck`]. Collaborators default to the built-in action
/// factory, a device sink that only logs and a five second save debounce.
pub struct DeckBuilder {
    model: DeviceModel,
    factory: Option<Box<dyn ActionFactory>>,
    device: Option<Box<dyn DeviceSink>>,
    persistence: Option<Box<dyn Persistence>>,
    event_capacity: usize,
}

impl DeckBuilder {
    #[must_use]
    pub fn new(model: DeviceModel) -> Self {
        Self {
            model,
            factory: None,
            device: None,
            persistence: None,
            event_capacity: EVENT_CAPACITY,
        }
    }

    #[must_use]
    pub fn factory(mut self, factory: impl ActionFactory + 'static) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    #[must_use]
    pub fn device(mut self, device: impl DeviceSink + 'static) -> Self {
        self.device = Some(Box::new(device));
        self
    }

    #[must_use]
    pub fn persistence(mut self, persistence: impl Persistence + 'static) -> Self {
        self.persistence = Some(Box::new(persistence));
        self
    }

    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Create the buttons, decode the profile and realize its root page.
    #[instrument(skip_all, fields(model = %self.model, profile = %profile.name))]
    pub fn build(self, profile: &ProfileDocument) -> Deck {
        let (width, height) = self.model.key_dimensions();
        let icon_size = IconSize::new(width, height);
        let mut pages = PageTree::new();
        let root = pages.insert_document(None, &profile.root);
        let (events, _) = broadcast::channel(self.event_capacity);

        let mut deck = Deck {
            model: self.model,
            icon_size,
            profile_id: profile.id,
            profile_name: profile.name.clone(),
            icons: SlotMap::with_key(),
            actions: SlotMap::with_key(),
            buttons: SlotMap::with_key(),
            grid: Vec::with_capacity(usize::from(self.model.key_count())),
            pages,
            root,
            active_pages: Vec::new(),
            brightness: profile.brightness.min(100),
            factory: self.factory.unwrap_or_else(|| Box::new(BuiltinActions)),
            device: self.device.unwrap_or_else(|| Box::new(OfflineDevice)),
            persistence: self
                .persistence
                .unwrap_or_else(|| Box::new(DebouncedSave::default())),
            events,
        };

        for position in 0..self.model.key_count() {
            let button = deck.buttons.insert(Button::new(position, icon_size));
            deck.grid.push(button);

            // Every key starts out with a blank custom icon so the device
            // gets cleared before the root page is drawn.
            let blank = deck.create_icon(IconContents::default());
            deck.inhibit(button);
            deck.set_custom_icon(button, Some(blank));
            deck.uninhibit(button);
        }

        if let Err(err) = deck.device.set_brightness(deck.brightness) {
            warn!(%err, "Failed to set initial brightness");
        }

        deck.active_pages.push(root);
        deck.update_all_items(root);
        info!(keys = deck.grid.len(), pages = deck.pages.len(), "Deck ready");
        deck
    }
}

/// One device: buttons, their bound objects and the page tree.
pub struct Deck {
    pub(crate) model: DeviceModel,
    pub(crate) icon_size: IconSize,
    pub(crate) profile_id: Uuid,
    pub(crate) profile_name: String,
    pub(crate) icons: SlotMap<IconId, Icon>,
    pub(crate) actions: SlotMap<ActionId, ActionSlot>,
    pub(crate) buttons: SlotMap<ButtonId, Button>,
    /// Buttons by position.
    pub(crate) grid: Vec<ButtonId>,
    pub(crate) pages: PageTree,
    pub(crate) root: PageId,
    /// Root first, active page last.
    pub(crate) active_pages: Vec<PageId>,
    pub(crate) brightness: u8,
    pub(crate) factory: Box<dyn ActionFactory>,
    pub(crate) device: Box<dyn DeviceSink>,
    pub(crate) persistence: Box<dyn Persistence>,
    pub(crate) events: broadcast::Sender<DeckEvent>,
}

impl fmt::Debug for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deck")
            .field("model", &self.model)
            .field("profile", &self.profile_name)
            .field("icons", &self.icons.len())
            .field("actions", &self.actions.len())
            .field("pages", &self.pages.len())
            .field("depth", &(self.active_pages.len().saturating_sub(1)))
            .finish_non_exhaustive()
    }
}

impl Deck {
    #[must_use]
    pub fn builder(model: DeviceModel) -> DeckBuilder {
        DeckBuilder::new(model)
    }

    // === Accessors ===

    #[must_use]
    pub const fn model(&self) -> DeviceModel {
        self.model
    }

    #[must_use]
    pub const fn icon_size(&self) -> IconSize {
        self.icon_size
    }

    #[must_use]
    pub const fn profile_id(&self) -> Uuid {
        self.profile_id
    }

    #[must_use]
    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    /// Buttons in position order.
    #[must_use]
    pub fn buttons(&self) -> &[ButtonId] {
        &self.grid
    }

    #[must_use]
    pub fn button_at(&self, position: u8) -> Option<ButtonId> {
        self.grid.get(usize::from(position)).copied()
    }

    /// Like [`Deck::button_at`] but reports out-of-range keys to the user.
    pub fn key(&self, position: u8) -> Result<ButtonId> {
        self.button_at(position).ok_or_else(|| {
            let max = self.model.key_count();
            DeckError::InvalidKeyIndex {
                index: position,
                max,
                max_idx: max.saturating_sub(1),
            }
        })
    }

    #[must_use]
    pub fn button(&self, id: ButtonId) -> Option<&Button> {
        self.buttons.get(id)
    }

    #[must_use]
    pub fn icon(&self, id: IconId) -> Option<&Icon> {
        self.icons.get(id)
    }

    #[must_use]
    pub fn action(&self, id: ActionId) -> Option<&dyn Action> {
        self.actions.get(id).map(|slot| slot.behavior.as_ref())
    }

    /// The icon owned by an action.
    #[must_use]
    pub fn action_icon(&self, id: ActionId) -> Option<IconId> {
        self.actions.get(id).map(|slot| slot.icon)
    }

    /// The button an action is currently bound to.
    #[must_use]
    pub fn action_owner(&self, id: ActionId) -> Option<ButtonId> {
        self.actions.get(id).and_then(|slot| slot.owner)
    }

    #[must_use]
    pub const fn pages(&self) -> &PageTree {
        &self.pages
    }

    #[must_use]
    pub const fn root_page(&self) -> PageId {
        self.root
    }

    #[must_use]
    pub fn active_page(&self) -> PageId {
        self.active_pages.last().copied().unwrap_or(self.root)
    }

    /// The page stack, root first.
    #[must_use]
    pub fn active_pages(&self) -> &[PageId] {
        &self.active_pages
    }

    #[must_use]
    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Number of live icons and actions, for leak checks.
    #[must_use]
    pub fn live_objects(&self) -> (usize, usize) {
        (self.icons.len(), self.actions.len())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeckEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn list_kinds(&self) -> Vec<ActionInfo> {
        self.factory.list_kinds()
    }

    // === Object lifetime ===

    /// Create a floating icon. The first holder adopts it; releasing a
    /// floating icon discards it.
    pub fn create_icon(&mut self, contents: IconContents) -> IconId {
        if !contents.opacity_is_valid() {
            warn!(opacity = ?contents.opacity, "Icon opacity outside 0..=1");
        }
        self.icons.insert(Icon::new(contents, self.icon_size))
    }

    /// Create a floating action of `kind` for the key at `position` on the
    /// active page.
    pub fn create_action(&mut self, kind: &str, position: u8) -> Result<ActionId> {
        let mut ctx = super::action::BuildContext {
            position,
            active_page: self.active_page(),
            icon_size: self.icon_size,
            pages: &mut self.pages,
        };
        let behavior = self
            .factory
            .create(kind, &mut ctx)
            .ok_or_else(|| DeckError::UnknownActionKind {
                kind: kind.to_string(),
            })?;
        Ok(self.insert_action(behavior))
    }

    /// Adopt an action built outside the factory. It starts floating.
    pub fn insert_action(&mut self, behavior: Box<dyn Action>) -> ActionId {
        let mut icon = Icon::new(behavior.icon_contents(), self.icon_size);
        icon.holders = 1;
        let icon = self.icons.insert(icon);
        let id = self.actions.insert(ActionSlot {
            behavior,
            icon,
            owner: None,
            holders: 0,
        });
        trace!(?id, ?icon, "Inserted action");
        id
    }

    pub fn hold_icon(&mut self, id: IconId) {
        match self.icons.get_mut(id) {
            Some(icon) => icon.holders += 1,
            None => warn!(?id, "Holding a stale icon"),
        }
    }

    pub fn release_icon(&mut self, id: IconId) {
        let Some(icon) = self.icons.get_mut(id) else {
            warn!(?id, "Releasing a stale icon");
            return;
        };
        icon.holders = icon.holders.saturating_sub(1);
        if icon.holders == 0 {
            self.icons.remove(id);
            trace!(?id, "Destroyed icon");
        }
    }

    pub fn hold_action(&mut self, id: ActionId) {
        match self.actions.get_mut(id) {
            Some(slot) => slot.holders += 1,
            None => warn!(?id, "Holding a stale action"),
        }
    }

    /// Drop one hold. The last release destroys the action, its icon and
    /// any page it owns.
    pub fn release_action(&mut self, id: ActionId) {
        let Some(slot) = self.actions.get_mut(id) else {
            warn!(?id, "Releasing a stale action");
            return;
        };
        slot.holders = slot.holders.saturating_sub(1);
        if slot.holders > 0 {
            return;
        }

        let Some(slot) = self.actions.remove(id) else {
            return;
        };
        self.release_icon(slot.icon);
        if let Some(page) = slot.behavior.owned_page() {
            self.discard_page(page);
        }
        trace!(?id, kind = slot.behavior.kind_id(), "Destroyed action");
    }

    // === Active page stack ===

    /// Enter `page`, which must be a direct child of the active page and not
    /// already on the stack.
    #[instrument(skip(self))]
    pub fn push_page(&mut self, page: PageId) -> bool {
        if !self.pages.contains(page) {
            warn!(?page, "push_page with a stale page");
            return false;
        }
        let active = self.active_page();
        if self.pages.parent(page) != Some(active) {
            warn!(?page, "push_page: page is not a child of the active page");
            return false;
        }
        if self.active_pages.contains(&page) {
            warn!(?page, "push_page: page is already on the stack");
            return false;
        }

        self.capture_live_buttons(active);
        self.active_pages.push(page);
        self.update_all_items(page);

        let depth = self.active_pages.len() - 1;
        info!(depth, "Entered folder");
        self.emit(DeckEvent::ActivePageChanged { depth });
        true
    }

    /// Return to the parent page. The root is never popped.
    #[instrument(skip(self))]
    pub fn pop_page(&mut self) -> bool {
        if self.active_pages.len() <= 1 {
            warn!("pop_page on the root page");
            return false;
        }
        let Some(leaving) = self.active_pages.pop() else {
            return false;
        };

        self.capture_live_buttons(leaving);
        let active = self.active_page();
        self.update_all_items(active);

        let depth = self.active_pages.len() - 1;
        info!(depth, "Left folder");
        self.emit(DeckEvent::ActivePageChanged { depth });
        true
    }

    fn capture_live_buttons(&mut self, page: PageId) {
        let grid = self.grid.clone();
        for button in grid {
            self.update_item_from_button(page, button);
        }
    }

    // === Device-wide state ===

    pub fn set_brightness(&mut self, brightness: u8) {
        let brightness = brightness.min(100);
        self.brightness = brightness;
        if let Err(err) = self.device.set_brightness(brightness) {
            warn!(%err, brightness, "Failed to set brightness");
        }
        self.emit(DeckEvent::BrightnessChanged { brightness });
        self.request_save();
    }

    pub(crate) fn apply_command(&mut self, command: DeckCommand) {
        debug!(?command, "Applying action command");
        match command {
            DeckCommand::PushPage(page) => {
                self.push_page(page);
            }
            DeckCommand::PopPage => {
                self.pop_page();
            }
            DeckCommand::SetBrightness(brightness) => self.set_brightness(brightness),
        }
    }

    // === Persistence ===

    /// Snapshot the whole profile. Live buttons are captured into the
    /// active page first.
    pub fn to_document(&mut self) -> ProfileDocument {
        self.capture_live_buttons(self.active_page());
        ProfileDocument {
            id: self.profile_id,
            name: self.profile_name.clone(),
            brightness: self.brightness,
            modified: Some(Utc::now()),
            root: self.page_to_document(self.root),
        }
    }

    /// Returns a document to write when the save scheduler says one is due.
    pub fn poll_save(&mut self, now: Instant) -> Option<ProfileDocument> {
        if self.persistence.take_due(now) {
            Some(self.to_document())
        } else {
            None
        }
    }

    pub(crate) fn request_save(&mut self) {
        trace!("Requesting save");
        self.persistence.save();
    }

    pub(crate) fn emit(&self, event: DeckEvent) {
        trace!(?event, "Deck event");
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}
