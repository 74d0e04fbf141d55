//! Drag-and-drop exchange of keys.

use deck::actions::{brightness, navigation};
use deck::config::ProfileDocument;
use deck::model::{DeckEvent, IconContents};

use crate::common::{TestDeck, drain, fixtures};

#[test]
fn test_swap_exchanges_actions_and_icons() {
    let mut t = TestDeck::new(&fixtures::mixed_profile());
    let (a, b) = (t.key(1), t.key(2));
    let action = t.action_at(1).unwrap();
    let icon = t.deck.button(b).unwrap().custom_icon().unwrap();

    assert!(t.deck.swap_buttons(a, b));

    assert_eq!(t.deck.button(a).unwrap().action(), None);
    assert_eq!(t.deck.button(a).unwrap().custom_icon(), Some(icon));
    assert_eq!(t.deck.button(b).unwrap().action(), Some(action));
    assert_eq!(t.deck.button(b).unwrap().custom_icon(), None);
    assert_eq!(t.deck.action_owner(action), Some(b));
    assert_eq!(t.deck.icon(icon).unwrap().subscriber(), Some(a));
}

#[test]
fn test_swapping_twice_restores_the_document() {
    let profile = fixtures::mixed_profile();
    let mut t = TestDeck::new(&profile);
    let (a, b) = (t.key(1), t.key(4));

    assert!(t.deck.swap_buttons(a, b));
    let swapped = t.deck.to_document();
    assert_eq!(swapped.root.bindings[&4].kind.as_deref(), Some(brightness::KIND));
    assert_eq!(swapped.root.bindings[&1].kind.as_deref(), Some("obs-scene"));

    assert!(t.deck.swap_buttons(b, a));
    assert_eq!(t.deck.to_document().root, profile.root);
}

#[test]
fn test_swap_with_empty_key_moves_binding() {
    let mut t = TestDeck::new(&ProfileDocument::new("Move"));
    t.bind(1, brightness::KIND);
    t.device.clear_operations();
    let mut events = t.deck.subscribe();

    assert!(t.deck.swap_buttons(t.key(1), t.key(5)));

    assert_eq!(t.kind_at(5).as_deref(), Some(brightness::KIND));
    assert_eq!(t.kind_at(1), None);
    assert_eq!(t.device.key_icon(1), t.deck.composed_icon(t.key(1)));
    t.device.assert_key_icon_name(5, Some(brightness::SET_ICON));

    let events = drain(&mut events);
    assert!(events.contains(&DeckEvent::ButtonChanged { position: 1 }));
    assert!(events.contains(&DeckEvent::ButtonChanged { position: 5 }));

    let doc = t.deck.to_document();
    assert!(!doc.root.bindings.contains_key(&1));
    assert!(doc.root.bindings.contains_key(&5));
}

#[test]
fn test_swap_saves_once() {
    let mut t = TestDeck::new(&fixtures::mixed_profile());
    assert!(t.deck.swap_buttons(t.key(1), t.key(3)));
    assert_eq!(t.saves.saves(), 1);
}

#[test]
fn test_swap_keeps_objects_alive() {
    let mut t = TestDeck::new(&fixtures::mixed_profile());
    let before = t.deck.live_objects();
    let pages = t.deck.pages().len();

    assert!(t.deck.swap_buttons(t.key(3), t.key(2)));

    assert_eq!(t.deck.live_objects(), before);
    assert_eq!(t.deck.pages().len(), pages, "moved folder keeps its page");
}

#[test]
fn test_moved_folder_still_opens_its_page() {
    let mut t = TestDeck::new(&fixtures::mixed_profile());
    assert!(t.deck.swap_buttons(t.key(3), t.key(5)));

    t.press(5);
    assert_eq!(t.depth(), 1);
    assert_eq!(t.kind_at(2).as_deref(), Some(brightness::KIND));
}

#[test]
fn test_go_up_key_cannot_be_dragged_or_dropped_on() {
    let mut t = TestDeck::new(&ProfileDocument::new("Guard"));
    t.bind(3, navigation::KIND);
    t.press(3);
    t.bind(2, brightness::KIND);
    let (up, other) = (t.key(0), t.key(2));
    t.saves.reset();

    assert!(!t.deck.can_drag(up));
    assert!(!t.deck.can_drop(up));
    assert!(t.deck.can_drag(other));
    assert!(!t.deck.swap_buttons(up, other));
    assert!(!t.deck.swap_buttons(other, up));

    assert_eq!(t.kind_at(0).as_deref(), Some(navigation::KIND));
    assert_eq!(t.kind_at(2).as_deref(), Some(brightness::KIND));
    assert_eq!(t.saves.saves(), 0);
}

#[test]
fn test_key_zero_on_root_is_an_ordinary_key() {
    let mut t = TestDeck::new(&ProfileDocument::new("Root"));
    t.bind(0, navigation::KIND);
    assert!(!t.deck.is_navigate_up_slot(t.key(0)));
    assert!(t.deck.swap_buttons(t.key(0), t.key(1)));
    assert_eq!(t.kind_at(1).as_deref(), Some(navigation::KIND));
}

#[test]
fn test_swap_with_itself_is_rejected() {
    let mut t = TestDeck::new(&ProfileDocument::new("Self"));
    let icon = t.deck.create_icon(IconContents::named("x"));
    t.deck.set_custom_icon(t.key(1), Some(icon));
    t.saves.reset();

    assert!(!t.deck.swap_buttons(t.key(1), t.key(1)));
    assert_eq!(t.deck.button(t.key(1)).unwrap().custom_icon(), Some(icon));
    assert_eq!(t.saves.saves(), 0);
}
