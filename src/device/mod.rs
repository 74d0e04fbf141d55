//! Hardware collaborator.
//!
//! The deck pushes composed key icons and brightness changes through
//! [`DeviceSink`] and never waits on the result: sinks report failures as
//! errors, the deck logs them and carries on. The next mutation of a key
//! uploads it again.

pub mod channel;
mod info;
pub mod mock;

pub use channel::{ChannelDevice, DeviceRequest, RenderedKeys, spawn_render_worker};
pub use info::DeviceModel;

use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::model::ComposedIcon;

/// Receives key icons and brightness changes.
///
/// Calls must not block; sinks with slow transports queue the request.
pub trait DeviceSink {
    /// Show `icon` on the key at `position`. A later upload to the same key
    /// supersedes this one.
    fn upload_icon(&self, position: u8, icon: &ComposedIcon) -> Result<()>;

    /// Set display brightness (0-100).
    fn set_brightness(&self, percent: u8) -> Result<()>;
}

impl<T: DeviceSink + ?Sized> DeviceSink for Arc<T> {
    fn upload_icon(&self, position: u8, icon: &ComposedIcon) -> Result<()> {
        (**self).upload_icon(position, icon)
    }

    fn set_brightness(&self, percent: u8) -> Result<()> {
        (**self).set_brightness(percent)
    }
}

impl<T: DeviceSink + ?Sized> DeviceSink for Box<T> {
    fn upload_icon(&self, position: u8, icon: &ComposedIcon) -> Result<()> {
        (**self).upload_icon(position, icon)
    }

    fn set_brightness(&self, percent: u8) -> Result<()> {
        (**self).set_brightness(percent)
    }
}

/// Sink used when no device is attached. Requests are only traced.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineDevice;

impl DeviceSink for OfflineDevice {
    fn upload_icon(&self, position: u8, icon: &ComposedIcon) -> Result<()> {
        trace!(position, icon_name = ?icon.icon_name, "Offline upload");
        Ok(())
    }

    fn set_brightness(&self, percent: u8) -> Result<()> {
        trace!(percent, "Offline brightness");
        Ok(())
    }
}
