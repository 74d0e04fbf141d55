//! Fire-and-forget device sink backed by a tokio channel.
//!
//! The deck side never blocks: requests are queued on an unbounded channel
//! and a worker task rasterizes them. The worker keeps the latest frame per
//! key and can mirror frames to PNG files.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use image::RgbaImage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::DeviceSink;
use crate::error::{DeckError, Result};
use crate::image_ops::{self, ResizeStrategy};
use crate::model::ComposedIcon;

/// A queued request for the device.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceRequest {
    Upload { position: u8, icon: ComposedIcon },
    Brightness(u8),
}

/// Sender half handed to the deck.
#[derive(Debug, Clone)]
pub struct ChannelDevice {
    tx: mpsc::UnboundedSender<DeviceRequest>,
}

impl ChannelDevice {
    /// Create a sink and the receiver a worker drains.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeviceRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, request: DeviceRequest) -> Result<()> {
        self.tx
            .send(request)
            .map_err(|_| DeckError::DeviceCommunication("device worker stopped".to_string()))
    }
}

impl DeviceSink for ChannelDevice {
    fn upload_icon(&self, position: u8, icon: &ComposedIcon) -> Result<()> {
        self.send(DeviceRequest::Upload {
            position,
            icon: icon.clone(),
        })
    }

    fn set_brightness(&self, percent: u8) -> Result<()> {
        self.send(DeviceRequest::Brightness(percent))
    }
}

/// Latest rendered frame per key, shared with the worker.
#[derive(Debug, Clone, Default)]
pub struct RenderedKeys {
    inner: Arc<Mutex<RenderedState>>,
}

#[derive(Debug, Default)]
struct RenderedState {
    frames: BTreeMap<u8, RgbaImage>,
    brightness: Option<u8>,
    uploads: usize,
}

impl RenderedKeys {
    /// Frame currently shown on `position`.
    pub fn frame(&self, position: u8) -> Option<RgbaImage> {
        self.lock().frames.get(&position).cloned()
    }

    /// Keys that received at least one frame.
    pub fn positions(&self) -> Vec<u8> {
        self.lock().frames.keys().copied().collect()
    }

    pub fn brightness(&self) -> Option<u8> {
        self.lock().brightness
    }

    /// Total uploads processed, including superseded ones.
    pub fn uploads(&self) -> usize {
        self.lock().uploads
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RenderedState> {
        // A panicking renderer leaves frames intact, so poisoning is ignored.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Spawn the task that drains `rx` until every sender is dropped.
///
/// With `out_dir`, each frame is also written to `key-<position>.png`.
pub fn spawn_render_worker(
    mut rx: mpsc::UnboundedReceiver<DeviceRequest>,
    strategy: ResizeStrategy,
    out_dir: Option<PathBuf>,
) -> (RenderedKeys, JoinHandle<anyhow::Result<()>>) {
    let keys = RenderedKeys::default();
    let shared = keys.clone();

    let handle = tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            match request {
                DeviceRequest::Upload { position, icon } => {
                    let frame = tokio::task::spawn_blocking(move || {
                        image_ops::render(&icon, strategy)
                    })
                    .await
                    .context("render task panicked")?;

                    if let Some(dir) = &out_dir {
                        let path = dir.join(format!("key-{position}.png"));
                        if let Err(e) = frame.save_with_format(&path, image::ImageFormat::Png) {
                            warn!(position, path = %path.display(), error = %e, "Failed to write frame");
                        }
                    }

                    debug!(position, "Frame rendered");
                    let mut state = shared.lock();
                    state.frames.insert(position, frame);
                    state.uploads += 1;
                }
                DeviceRequest::Brightness(percent) => {
                    shared.lock().brightness = Some(percent);
                }
            }
        }
        info!(keys = shared.lock().frames.len(), "Device worker finished");
        Ok(())
    });

    (keys, handle)
}
