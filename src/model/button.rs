//! Button slots: icon resolution, press handling and batching.
//!
//! Every mutation that changes what a key shows runs the same steps, in
//! order: point the custom icon at the action icon, capture the key into the
//! active page and request a save (skipped while inhibited), upload the
//! composed icon, then notify listeners.

use tracing::{debug, instrument, trace, warn};

use super::action::{ActivationContext, PreferenceValue};
use super::deck::{Deck, DeckEvent};
use super::icon::{ComposedIcon, IconContents, IconSize};
use super::{ActionId, ButtonId, IconId};
use crate::error::{DeckError, Result};

/// One key slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub(crate) position: u8,
    pub(crate) icon_size: IconSize,
    pub(crate) pressed: bool,
    pub(crate) inhibit_count: u32,
    pub(crate) action: Option<ActionId>,
    pub(crate) custom_icon: Option<IconId>,
}

impl Button {
    pub(crate) const fn new(position: u8, icon_size: IconSize) -> Self {
        Self {
            position,
            icon_size,
            pressed: false,
            inhibit_count: 0,
            action: None,
            custom_icon: None,
        }
    }

    #[must_use]
    pub const fn position(&self) -> u8 {
        self.position
    }

    #[must_use]
    pub const fn icon_size(&self) -> IconSize {
        self.icon_size
    }

    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.pressed
    }

    #[must_use]
    pub const fn inhibit_count(&self) -> u32 {
        self.inhibit_count
    }

    #[must_use]
    pub const fn action(&self) -> Option<ActionId> {
        self.action
    }

    #[must_use]
    pub const fn custom_icon(&self) -> Option<IconId> {
        self.custom_icon
    }
}

/// Which listener-facing notification a propagation ends with.
#[derive(Debug, Clone, Copy)]
enum Change {
    Binding,
    Icon,
}

impl Deck {
    /// The icon the key shows: the custom icon if set, else the action's.
    #[must_use]
    pub fn get_icon(&self, button: ButtonId) -> Option<IconId> {
        let slot = self.buttons.get(button)?;
        slot.custom_icon
            .or_else(|| slot.action.and_then(|a| self.action_icon(a)))
    }

    /// Composed form of what the key shows, blank when unbound.
    #[must_use]
    pub fn composed_icon(&self, button: ButtonId) -> Option<ComposedIcon> {
        let slot = self.buttons.get(button)?;
        Some(
            self.get_icon(button)
                .and_then(|icon| ComposedIcon::compose(&self.icons, icon))
                .unwrap_or_else(|| ComposedIcon::blank(slot.icon_size)),
        )
    }

    /// Bind `action` to the key, or unbind with `None`.
    ///
    /// Binding an action drops the custom icon. An action already bound to
    /// another key is refused.
    #[instrument(level = "debug", skip(self))]
    pub fn set_action(&mut self, button: ButtonId, action: Option<ActionId>) {
        let Some(slot) = self.buttons.get(button) else {
            warn!(?button, "set_action on a stale button");
            return;
        };
        let previous = slot.action;
        if previous == action {
            return;
        }

        if let Some(new) = action {
            match self.actions.get(new) {
                None => {
                    warn!(?new, "set_action with a stale action");
                    return;
                }
                Some(entry) if entry.owner.is_some_and(|owner| owner != button) => {
                    warn!(?new, "Action is already bound to another button");
                    return;
                }
                Some(_) => {}
            }
            self.detach_custom_icon(button);
        }

        if let Some(old) = previous {
            self.unsubscribe_action(old, button);
        }
        if let Some(new) = action {
            self.subscribe_action(new, button);
            self.hold_action(new);
        }
        if let Some(slot) = self.buttons.get_mut(button) {
            slot.action = action;
        }
        if let Some(old) = previous {
            self.release_action(old);
        }

        self.propagate(button, Change::Binding);
    }

    /// Set or clear the key's custom icon. A bound action stays bound and
    /// the custom icon is drawn on top of its icon.
    #[instrument(level = "debug", skip(self))]
    pub fn set_custom_icon(&mut self, button: ButtonId, icon: Option<IconId>) {
        let Some(slot) = self.buttons.get(button) else {
            warn!(?button, "set_custom_icon on a stale button");
            return;
        };
        if slot.custom_icon == icon {
            return;
        }
        if let Some(new) = icon {
            match self.icons.get(new) {
                None => {
                    warn!(?new, "set_custom_icon with a stale icon");
                    return;
                }
                Some(entry) if entry.subscriber.is_some_and(|s| s != button) => {
                    warn!(?new, "Icon is already shown by another button");
                    return;
                }
                Some(_) => {}
            }
            self.hold_icon(new);
            if let Some(entry) = self.icons.get_mut(new) {
                entry.subscriber = Some(button);
            }
        }

        self.detach_custom_icon(button);
        if let Some(slot) = self.buttons.get_mut(button) {
            slot.custom_icon = icon;
        }

        self.propagate(button, Change::Binding);
    }

    /// Press or release the key. Only a bound action is activated or
    /// deactivated, and only on a state change.
    #[instrument(level = "debug", skip(self))]
    pub fn set_pressed(&mut self, button: ButtonId, pressed: bool) {
        let Some(slot) = self.buttons.get_mut(button) else {
            warn!(?button, "set_pressed on a stale button");
            return;
        };
        if slot.pressed == pressed {
            return;
        }
        // Recorded even when unbound, so a key whose folder action was
        // swapped out between press and release is not left held down.
        // Nothing is activated and no event is sent for an unbound key.
        slot.pressed = pressed;
        let Some(action) = slot.action else {
            return;
        };

        let ctx = ActivationContext {
            position: slot.position,
            active_page: self.active_page(),
            brightness: self.brightness,
        };
        self.emit(DeckEvent::Pressed {
            position: ctx.position,
            pressed,
        });

        let Some(entry) = self.actions.get_mut(action) else {
            return;
        };
        let command = if pressed {
            entry.behavior.activate(&ctx)
        } else {
            entry.behavior.deactivate(&ctx)
        };

        self.sync_action_icon(action);
        if let Some(command) = command {
            self.apply_command(command);
        }
    }

    /// Suspend page persistence for this key. Uploads and notifications
    /// continue as usual.
    pub fn inhibit(&mut self, button: ButtonId) {
        match self.buttons.get_mut(button) {
            Some(slot) => slot.inhibit_count += 1,
            None => warn!(?button, "inhibit on a stale button"),
        }
    }

    /// Undo one [`Deck::inhibit`].
    pub fn uninhibit(&mut self, button: ButtonId) {
        match self.buttons.get_mut(button) {
            Some(slot) if slot.inhibit_count > 0 => slot.inhibit_count -= 1,
            Some(_) => warn!(?button, "uninhibit without a matching inhibit"),
            None => warn!(?button, "uninhibit on a stale button"),
        }
    }

    /// Edit an icon in place and notify the key subscribed to it.
    pub fn update_icon(&mut self, icon: IconId, edit: impl FnOnce(&mut IconContents)) {
        let Some(entry) = self.icons.get_mut(icon) else {
            warn!(?icon, "update_icon on a stale icon");
            return;
        };
        edit(&mut entry.contents);
        if !entry.contents.opacity_is_valid() {
            warn!(?icon, opacity = ?entry.contents.opacity, "Icon opacity outside 0..=1");
        }

        match entry.subscriber {
            Some(button) => self.propagate(button, Change::Icon),
            None => trace!(?icon, "Icon changed with no subscriber"),
        }
    }

    /// Apply a preference edit to an action and persist the result.
    pub fn set_action_preference(
        &mut self,
        action: ActionId,
        key: &str,
        value: &PreferenceValue,
    ) -> Result<()> {
        let entry = self
            .actions
            .get_mut(action)
            .ok_or_else(|| DeckError::Other("stale action handle".to_string()))?;
        entry.behavior.set_preference(key, value)?;
        debug!(?action, key, "Action preference changed");

        let owner = entry.owner;
        self.sync_action_icon(action);
        if let Some(button) = owner {
            self.persist(button);
        }
        Ok(())
    }

    /// Push the action's desired contents into its icon if they differ.
    pub(crate) fn sync_action_icon(&mut self, action: ActionId) {
        let Some(entry) = self.actions.get(action) else {
            return;
        };
        let (icon, wanted) = (entry.icon, entry.behavior.icon_contents());
        if self.icons.get(icon).is_some_and(|i| i.contents != wanted) {
            self.update_icon(icon, |contents| *contents = wanted);
        }
    }

    fn subscribe_action(&mut self, action: ActionId, button: ButtonId) {
        let Some(entry) = self.actions.get_mut(action) else {
            return;
        };
        entry.owner = Some(button);
        let icon = entry.icon;
        if let Some(icon) = self.icons.get_mut(icon) {
            icon.subscriber = Some(button);
        }
    }

    fn unsubscribe_action(&mut self, action: ActionId, button: ButtonId) {
        let Some(entry) = self.actions.get_mut(action) else {
            return;
        };
        if entry.owner == Some(button) {
            entry.owner = None;
        }
        let icon = entry.icon;
        if let Some(icon) = self.icons.get_mut(icon) {
            if icon.subscriber == Some(button) {
                icon.subscriber = None;
            }
        }
    }

    /// Drop the custom icon slot without propagating.
    pub(crate) fn detach_custom_icon(&mut self, button: ButtonId) {
        let Some(old) = self.buttons.get_mut(button).and_then(|s| s.custom_icon.take()) else {
            return;
        };
        if let Some(icon) = self.icons.get_mut(old) {
            if icon.subscriber == Some(button) {
                icon.subscriber = None;
            }
            icon.relative = None;
        }
        self.release_icon(old);
    }

    /// Drop the action slot without propagating.
    pub(crate) fn detach_action(&mut self, button: ButtonId) {
        let Some(old) = self.buttons.get_mut(button).and_then(|s| s.action.take()) else {
            return;
        };
        self.unsubscribe_action(old, button);
        self.release_action(old);
    }

    fn propagate(&mut self, button: ButtonId, change: Change) {
        let Some(position) = self.buttons.get(button).map(|b| b.position) else {
            return;
        };
        self.update_relative(button);
        self.persist(button);
        self.upload(button);
        self.emit(match change {
            Change::Binding => DeckEvent::ButtonChanged { position },
            Change::Icon => DeckEvent::IconChanged { position },
        });
    }

    fn update_relative(&mut self, button: ButtonId) {
        let Some(slot) = self.buttons.get(button) else {
            return;
        };
        let Some(custom) = slot.custom_icon else {
            return;
        };
        let base = slot.action.and_then(|a| self.action_icon(a));
        if let Some(icon) = self.icons.get_mut(custom) {
            icon.relative = base;
        }
    }

    /// Capture the key into the active page and request a save, unless the
    /// key is inhibited. Call after the last `uninhibit` of a batch.
    pub fn persist(&mut self, button: ButtonId) {
        let Some(slot) = self.buttons.get(button) else {
            return;
        };
        if slot.inhibit_count > 0 {
            trace!(position = slot.position, "Persistence inhibited");
            return;
        }
        self.update_item_from_button(self.active_page(), button);
        self.request_save();
    }

    pub(crate) fn upload(&self, button: ButtonId) {
        let (Some(slot), Some(icon)) = (self.buttons.get(button), self.composed_icon(button))
        else {
            return;
        };
        if let Err(err) = self.device.upload_icon(slot.position, &icon) {
            warn!(position = slot.position, %err, "Failed to update device key icon");
        }
    }
}
