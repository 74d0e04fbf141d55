//! Drag-and-drop exchange of two keys.
//!
//! A swap moves the action and the custom icon of each key onto the other.
//! Both keys are inhibited while the four slots change hands, so the active
//! page is captured and saved once at the end.

use tracing::{debug, info, warn};

use super::ButtonId;
use super::deck::{Deck, DeckEvent};
use crate::actions::navigation;

impl Deck {
    /// The navigate-up key of a folder: position 0 of a non-root active
    /// page, bound to the navigation action.
    #[must_use]
    pub fn is_navigate_up_slot(&self, button: ButtonId) -> bool {
        let Some(slot) = self.buttons.get(button) else {
            return false;
        };
        slot.position == 0
            && self.pages.parent(self.active_page()).is_some()
            && slot
                .action
                .and_then(|a| self.action(a))
                .is_some_and(|a| a.kind_id() == navigation::KIND)
    }

    #[must_use]
    pub fn can_drag(&self, button: ButtonId) -> bool {
        self.buttons.contains_key(button) && !self.is_navigate_up_slot(button)
    }

    #[must_use]
    pub fn can_drop(&self, target: ButtonId) -> bool {
        self.buttons.contains_key(target) && !self.is_navigate_up_slot(target)
    }

    /// Exchange the contents of `dragged` and `dropped`.
    ///
    /// Returns false, leaving both keys untouched, when either key is the
    /// navigate-up slot or a handle is stale.
    pub fn swap_buttons(&mut self, dragged: ButtonId, dropped: ButtonId) -> bool {
        if dragged == dropped {
            return false;
        }
        if !self.can_drag(dragged) || !self.can_drop(dropped) {
            debug!(?dragged, ?dropped, "Swap rejected");
            return false;
        }
        let (Some(a), Some(b)) = (self.buttons.get(dragged), self.buttons.get(dropped)) else {
            warn!("swap_buttons with a stale button");
            return false;
        };
        let (action_a, icon_a) = (a.action, a.custom_icon);
        let (action_b, icon_b) = (b.action, b.custom_icon);
        let (pos_a, pos_b) = (a.position, b.position);

        // Keep all four alive while their slots are empty.
        for action in [action_a, action_b].into_iter().flatten() {
            self.hold_action(action);
        }
        for icon in [icon_a, icon_b].into_iter().flatten() {
            self.hold_icon(icon);
        }

        self.inhibit(dragged);
        self.inhibit(dropped);

        for button in [dragged, dropped] {
            self.detach_action(button);
            self.detach_custom_icon(button);
        }

        self.set_action(dragged, action_b);
        self.set_action(dropped, action_a);
        self.set_custom_icon(dragged, icon_b);
        self.set_custom_icon(dropped, icon_a);

        self.uninhibit(dragged);
        self.uninhibit(dropped);

        let page = self.active_page();
        self.update_item_from_button(page, dragged);
        self.update_item_from_button(page, dropped);
        self.request_save();

        for action in [action_a, action_b].into_iter().flatten() {
            self.release_action(action);
        }
        for icon in [icon_a, icon_b].into_iter().flatten() {
            self.release_icon(icon);
        }

        // Slots that ended up empty were never propagated by a setter.
        for (button, position, empty) in [
            (dragged, pos_a, action_b.is_none() && icon_b.is_none()),
            (dropped, pos_b, action_a.is_none() && icon_a.is_none()),
        ] {
            if empty {
                self.upload(button);
                self.emit(DeckEvent::ButtonChanged { position });
            }
        }

        info!(from = pos_a, to = pos_b, "Swapped keys");
        true
    }
}
