//! Common test utilities for the deck crate.
//!
//! - `cli`: runner for the `deck` binary with fluent assertions
//! - `fixtures`: profile documents and temporary profile/image files
//! - `logging`: log output verification helpers
#![allow(dead_code)]

pub mod cli;

use std::sync::Arc;

use deck::config::ProfileDocument;
use deck::device::DeviceModel;
use deck::device::mock::MockDevice;
use deck::model::{ActionId, ButtonId, Deck, DeckEvent};
use deck::persistence::RecordingPersistence;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A deck wired to a mock device and a save counter.
pub struct TestDeck {
    pub deck: Deck,
    pub device: Arc<MockDevice>,
    pub saves: RecordingPersistence,
}

impl TestDeck {
    /// Build a Mini (six keys) deck for `profile`. Operations recorded while
    /// building are cleared.
    #[must_use]
    pub fn new(profile: &ProfileDocument) -> Self {
        Self::with_model(DeviceModel::Mini, profile)
    }

    #[must_use]
    pub fn with_model(model: DeviceModel, profile: &ProfileDocument) -> Self {
        init_test_logging();
        let device = Arc::new(MockDevice::new(model));
        let saves = RecordingPersistence::default();
        let deck = Deck::builder(model)
            .device(Arc::clone(&device))
            .persistence(saves.clone())
            .build(profile);
        device.clear_operations();
        Self { deck, device, saves }
    }

    /// Button at `position`.
    ///
    /// # Panics
    ///
    /// Panics if the model has no such key.
    #[must_use]
    pub fn key(&self, position: u8) -> ButtonId {
        self.deck
            .button_at(position)
            .unwrap_or_else(|| panic!("no key {position}"))
    }

    /// Action bound to the key at `position`, if any.
    #[must_use]
    pub fn action_at(&self, position: u8) -> Option<ActionId> {
        self.deck.button(self.key(position)).and_then(|b| b.action())
    }

    /// Kind id of the action bound at `position`.
    #[must_use]
    pub fn kind_at(&self, position: u8) -> Option<String> {
        self.action_at(position)
            .and_then(|a| self.deck.action(a))
            .map(|a| a.kind_id().to_string())
    }

    /// Create an action of `kind` for `position` and bind it there.
    ///
    /// # Panics
    ///
    /// Panics if the kind is unknown.
    pub fn bind(&mut self, position: u8, kind: &str) -> ActionId {
        let action = self
            .deck
            .create_action(kind, position)
            .unwrap_or_else(|e| panic!("create {kind}: {e}"));
        let button = self.key(position);
        self.deck.set_action(button, Some(action));
        action
    }

    /// Press and release the key at `position`.
    pub fn press(&mut self, position: u8) {
        let button = self.key(position);
        self.deck.set_pressed(button, true);
        self.deck.set_pressed(button, false);
    }

    /// Current depth of the active page stack, 0 for the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.deck.active_pages().len() - 1
    }
}

/// Drain every event received so far.
pub fn drain(events: &mut broadcast::Receiver<DeckEvent>) -> Vec<DeckEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}
