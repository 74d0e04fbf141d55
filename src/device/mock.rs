//! Mock device for unit testing.
//!
//! Records every request the deck sends and supports assertions and
//! error injection.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use deck::device::mock::{MockDevice, Operation};
//!
//! let mock = Arc::new(MockDevice::mk2());
//! let deck = Deck::builder(DeviceModel::Mk2).device(Arc::clone(&mock)).build(&profile);
//!
//! mock.assert_contains(&Operation::SetBrightness { level: 70 });
//! ```

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use super::DeviceSink;
use super::info::DeviceModel;
use crate::error::{DeckError, Result};
use crate::model::ComposedIcon;

/// Recorded operation for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    SetBrightness { level: u8 },
    UploadIcon { key: u8, icon: ComposedIcon },
}

impl Operation {
    /// Key the operation targeted, if any.
    #[must_use]
    pub const fn key(&self) -> Option<u8> {
        match self {
            Self::UploadIcon { key, .. } => Some(*key),
            Self::SetBrightness { .. } => None,
        }
    }
}

/// Configuration for mock behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Fail after N operations (for testing error recovery).
    pub fail_after_ops: Option<usize>,
    /// Specific keys that should fail on upload.
    pub failing_keys: Vec<u8>,
    /// Initial connection state.
    pub connected: bool,
}

impl MockConfig {
    /// Create a connected mock configuration.
    #[must_use]
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Default::default()
        }
    }
}

/// Mock device for testing without real hardware.
pub struct MockDevice {
    model: DeviceModel,
    brightness: AtomicU8,
    keys: Mutex<Vec<Option<ComposedIcon>>>,
    operation_log: Mutex<Vec<Operation>>,
    error_injection: Mutex<Option<DeckError>>,
    config: MockConfig,
    op_count: Mutex<usize>,
    connected: AtomicBool,
}

impl MockDevice {
    /// Create a new mock device for the specified model.
    #[must_use]
    pub fn new(model: DeviceModel) -> Self {
        debug!(?model, "Creating mock device");
        Self {
            model,
            brightness: AtomicU8::new(100),
            keys: Mutex::new(vec![None; usize::from(model.key_count())]),
            operation_log: Mutex::new(Vec::new()),
            error_injection: Mutex::new(None),
            config: MockConfig::connected(),
            op_count: Mutex::new(0),
            connected: AtomicBool::new(true),
        }
    }

    /// Create mock for Stream Deck XL.
    #[must_use]
    pub fn xl() -> Self {
        Self::new(DeviceModel::Xl)
    }

    /// Create mock for Stream Deck Mini.
    #[must_use]
    pub fn mini() -> Self {
        Self::new(DeviceModel::Mini)
    }

    /// Create mock for Stream Deck MK.2.
    #[must_use]
    pub fn mk2() -> Self {
        Self::new(DeviceModel::Mk2)
    }

    #[must_use]
    pub const fn model(&self) -> DeviceModel {
        self.model
    }

    // === Configuration ===

    /// Configure mock behavior.
    #[must_use]
    pub fn with_config(mut self, config: MockConfig) -> Self {
        self.connected.store(config.connected, Ordering::SeqCst);
        self.config = config;
        self
    }

    /// Inject an error for the next operation.
    pub fn inject_error(&self, error: DeckError) {
        *self.error_injection.lock().unwrap() = Some(error);
    }

    /// Set device as disconnected.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Set device as connected.
    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    // === Assertions ===

    /// Get all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.operation_log.lock().unwrap().clone()
    }

    /// Get the number of operations performed.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operation_log.lock().unwrap().len()
    }

    /// Number of uploads that targeted `key`.
    #[must_use]
    pub fn uploads_to(&self, key: u8) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, Operation::UploadIcon { .. }) && op.key() == Some(key))
            .count()
    }

    /// Assert a specific operation was performed at least once.
    ///
    /// # Panics
    ///
    /// Panics if the operation was not found.
    pub fn assert_contains(&self, expected: &Operation) {
        let ops = self.operations();
        assert!(
            ops.contains(expected),
            "Expected operation {expected:?} not found in: {ops:#?}",
        );
    }

    /// Assert no operations were performed.
    ///
    /// # Panics
    ///
    /// Panics if any operations were recorded.
    pub fn assert_no_operations(&self) {
        let ops = self.operations();
        assert!(ops.is_empty(), "Expected no operations, but found: {ops:#?}");
    }

    /// Last icon uploaded to `key`.
    #[must_use]
    pub fn key_icon(&self, key: u8) -> Option<ComposedIcon> {
        self.keys
            .lock()
            .unwrap()
            .get(usize::from(key))
            .cloned()
            .flatten()
    }

    /// Assert the key currently shows a glyph with this icon name.
    ///
    /// # Panics
    ///
    /// Panics if the key shows something else.
    pub fn assert_key_icon_name(&self, key: u8, icon_name: Option<&str>) {
        let icon = self.key_icon(key);
        let actual = icon.as_ref().and_then(|i| i.icon_name.as_deref());
        assert_eq!(actual, icon_name, "Key {key} shows {icon:?}");
    }

    /// Get current brightness level.
    #[must_use]
    pub fn get_brightness(&self) -> u8 {
        self.brightness.load(Ordering::SeqCst)
    }

    /// Clear the operation log for fresh assertions.
    pub fn clear_operations(&self) {
        self.operation_log.lock().unwrap().clear();
        *self.op_count.lock().unwrap() = 0;
    }

    // === Internal Helpers ===

    fn record_op(&self, op: Operation) {
        trace!(?op, "Recording operation");
        self.operation_log.lock().unwrap().push(op);
        *self.op_count.lock().unwrap() += 1;
    }

    fn check_error(&self) -> Result<()> {
        if let Some(error) = self.error_injection.lock().unwrap().take() {
            return Err(error);
        }

        if !self.connected.load(Ordering::SeqCst) {
            return Err(DeckError::DeviceCommunication(
                "Mock device disconnected".to_string(),
            ));
        }

        if let Some(limit) = self.config.fail_after_ops {
            let count = *self.op_count.lock().unwrap();
            if count >= limit {
                return Err(DeckError::DeviceCommunication(
                    "Mock failure after ops limit".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn check_key(&self, key: u8) -> Result<()> {
        if self.config.failing_keys.contains(&key) {
            return Err(DeckError::DeviceCommunication(format!(
                "Mock key {key} configured to fail"
            )));
        }
        let max = self.model.key_count();
        if key >= max {
            return Err(DeckError::InvalidKeyIndex {
                index: key,
                max,
                max_idx: max - 1,
            });
        }
        Ok(())
    }
}

impl DeviceSink for MockDevice {
    fn upload_icon(&self, position: u8, icon: &ComposedIcon) -> Result<()> {
        self.check_error()?;
        self.check_key(position)?;

        self.record_op(Operation::UploadIcon {
            key: position,
            icon: icon.clone(),
        });
        self.keys.lock().unwrap()[usize::from(position)] = Some(icon.clone());
        Ok(())
    }

    fn set_brightness(&self, level: u8) -> Result<()> {
        self.check_error()?;
        self.record_op(Operation::SetBrightness { level });
        self.brightness.store(level.min(100), Ordering::SeqCst);
        Ok(())
    }
}

/// Builder for creating `MockDevice` with common configurations.
pub struct MockDeviceBuilder {
    model: DeviceModel,
    config: MockConfig,
    initial_brightness: u8,
}

impl MockDeviceBuilder {
    #[must_use]
    pub fn new(model: DeviceModel) -> Self {
        Self {
            model,
            config: MockConfig::connected(),
            initial_brightness: 100,
        }
    }

    /// Set device to fail after N operations.
    #[must_use]
    pub fn fail_after(mut self, ops: usize) -> Self {
        self.config.fail_after_ops = Some(ops);
        self
    }

    /// Set specific keys to fail.
    #[must_use]
    pub fn with_failing_keys(mut self, keys: Vec<u8>) -> Self {
        self.config.failing_keys = keys;
        self
    }

    /// Create device in disconnected state.
    #[must_use]
    pub fn disconnected(mut self) -> Self {
        self.config.connected = false;
        self
    }

    #[must_use]
    pub fn with_brightness(mut self, level: u8) -> Self {
        self.initial_brightness = level;
        self
    }

    #[must_use]
    pub fn build(self) -> MockDevice {
        let device = MockDevice::new(self.model).with_config(self.config);
        device
            .brightness
            .store(self.initial_brightness, Ordering::SeqCst);
        device
    }

    /// Build and wrap in an `Arc`, ready to hand to a deck and keep for
    /// assertions.
    #[must_use]
    pub fn shared(self) -> Arc<MockDevice> {
        Arc::new(self.build())
    }
}
