//! Applies the global scale to one image.
//!
//! Two stages, in this order:
//! 1. `height = max(natural × scale, floor)`, so nothing drops below legible.
//! 2. If that height makes the image wider than its cell, the width is
//!    pinned to the cell and the height re-derived from the aspect ratio.
//!
//! Stage 1 can push the realized grid height past the budget when many
//! images are squeezed. That overflow is accepted; nothing here re-shrinks
//! an image below its floor to force a fit.

use super::item::{ImageCell, ImageKind, MeasuredImage};
use super::measure::{CellGeometry, PT_PER_IN};
use super::ImageLayoutConfig;

/// Legibility floor in inches for a kind of image.
pub fn legibility_floor_in(kind: ImageKind, config: &ImageLayoutConfig) -> f64 {
    match kind {
        ImageKind::Screenshot => config.screenshot_min_height_in,
        ImageKind::Photograph => config.photo_min_height_in,
    }
}

/// Final display size `(width_pt, height_pt)` for a measured image.
pub fn display_size_pt(
    measured: &MeasuredImage,
    scale: f64,
    geometry: &CellGeometry,
    config: &ImageLayoutConfig,
) -> (f64, f64) {
    let aspect = measured.classified.aspect_ratio();
    let floor = legibility_floor_in(measured.kind(), config);
    let cell_width_pt = geometry.width_for(measured.kind()) * PT_PER_IN;

    let height_in = (measured.natural_height_in * scale).max(floor);
    let mut height_pt = height_in * PT_PER_IN;
    let mut width_pt = height_pt / aspect;
    if width_pt > cell_width_pt {
        width_pt = cell_width_pt;
        height_pt = width_pt * aspect;
    }
    (width_pt, height_pt)
}

/// Scale one image and wrap it with its caption.
pub fn apply_scale(
    measured: MeasuredImage,
    scale: f64,
    geometry: &CellGeometry,
    config: &ImageLayoutConfig,
) -> ImageCell {
    let (width_pt, height_pt) = display_size_pt(&measured, scale, geometry, config);
    let kind = measured.kind();
    let index = measured.index();
    ImageCell {
        index,
        kind,
        image: measured.classified.image,
        width_pt,
        height_pt,
        cell_width_pt: geometry.width_for(kind) * PT_PER_IN,
        caption: format!("Image {}", index),
    }
}
