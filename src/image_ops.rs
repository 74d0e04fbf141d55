//! Rasterizing composed icons.
//!
//! Layers are drawn in order: background, image (inline data or file),
//! symbolic glyph, text band. Everything above the background is scaled by
//! the icon opacity. There is no font stack, so glyphs and text are drawn as
//! foreground-colored markers.

use std::path::Path;

use clap::ValueEnum;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba as Pixel, RgbaImage};
use tracing::{debug, warn};

use crate::error::{DeckError, Result};
use crate::model::{ComposedIcon, Rgba};

/// Strategy for resizing images to match key dimensions.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum ResizeStrategy {
    /// Fit within key, maintain aspect ratio (may leave transparent bars).
    #[default]
    Fit,
    /// Fill key, maintain aspect ratio (may crop).
    Fill,
    /// Stretch to fill (may distort).
    Stretch,
}

/// Resize an image to exactly `width` x `height`.
#[must_use]
pub fn resize(img: &DynamicImage, width: u32, height: u32, strategy: ResizeStrategy) -> RgbaImage {
    let filter = FilterType::Lanczos3;
    match strategy {
        ResizeStrategy::Fit => {
            let resized = img.resize(width, height, filter).to_rgba8();
            let mut canvas = RgbaImage::new(width, height);
            let (rw, rh) = resized.dimensions();
            let x = (width - rw) / 2;
            let y = (height - rh) / 2;
            imageops::overlay(&mut canvas, &resized, x.into(), y.into());
            canvas
        }
        ResizeStrategy::Fill => img.resize_to_fill(width, height, filter).to_rgba8(),
        ResizeStrategy::Stretch => img.resize_exact(width, height, filter).to_rgba8(),
    }
}

/// Load the image layer of an icon, if it has one.
///
/// `file` accepts plain paths and `file://` URIs.
pub fn load_image_layer(icon: &ComposedIcon) -> Result<Option<DynamicImage>> {
    if let Some(data) = &icon.data {
        return image::load_from_memory(data)
            .map(Some)
            .map_err(|e| DeckError::ImageProcessing(e.to_string()));
    }
    let Some(file) = &icon.file else {
        return Ok(None);
    };
    let path = Path::new(file.strip_prefix("file://").unwrap_or(file));
    if !path.exists() {
        return Err(DeckError::ImageProcessing(format!(
            "image not found: {}",
            path.display()
        )));
    }
    image::open(path)
        .map(Some)
        .map_err(|e| DeckError::ImageProcessing(e.to_string()))
}

/// Draw `icon` into a new RGBA buffer of its own size.
#[must_use]
pub fn render(icon: &ComposedIcon, strategy: ResizeStrategy) -> RgbaImage {
    let (width, height) = (icon.width.max(1), icon.height.max(1));
    let mut canvas = RgbaImage::from_pixel(width, height, pixel(icon.background));
    let mut layers = RgbaImage::new(width, height);

    match load_image_layer(icon) {
        Ok(Some(img)) => {
            let img = resize(&img, width, height, strategy);
            imageops::overlay(&mut layers, &img, 0, 0);
        }
        Ok(None) => {}
        // A broken image still leaves the other layers visible.
        Err(err) => warn!(%err, "Skipping icon image layer"),
    }

    let fg = pixel(icon.color);
    if icon.icon_name.is_some() {
        draw_glyph_marker(&mut layers, fg);
    }
    if icon.text.as_deref().is_some_and(|t| !t.is_empty()) {
        draw_text_band(&mut layers, fg);
    }

    apply_opacity(&mut layers, icon.opacity);
    imageops::overlay(&mut canvas, &layers, 0, 0);

    debug!(width, height, "Rendered icon");
    canvas
}

/// Render and write a PNG.
pub fn save_png(icon: &ComposedIcon, strategy: ResizeStrategy, path: &Path) -> Result<()> {
    render(icon, strategy)
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| DeckError::ImageProcessing(e.to_string()))
}

const fn pixel(color: Rgba) -> Pixel<u8> {
    Pixel([color.r, color.g, color.b, color.a])
}

/// Filled circle in the middle half of the key.
fn draw_glyph_marker(img: &mut RgbaImage, fg: Pixel<u8>) {
    let (w, h) = img.dimensions();
    let (cx, cy) = (i64::from(w / 2), i64::from(h / 2));
    let r = i64::from(w.min(h) / 4);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let (dx, dy) = (i64::from(x) - cx, i64::from(y) - cy);
        if dx * dx + dy * dy <= r * r {
            *px = fg;
        }
    }
}

/// Strip along the bottom sixth of the key.
fn draw_text_band(img: &mut RgbaImage, fg: Pixel<u8>) {
    let (w, h) = img.dimensions();
    let top = h - (h / 6).max(1);
    for y in top..h {
        for x in (w / 8)..(w - w / 8) {
            img.put_pixel(x, y, fg);
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn apply_opacity(img: &mut RgbaImage, opacity: f32) {
    if opacity >= 1.0 {
        return;
    }
    let opacity = opacity.clamp(0.0, 1.0);
    for px in img.pixels_mut() {
        px.0[3] = (f32::from(px.0[3]) * opacity).round() as u8;
    }
}
