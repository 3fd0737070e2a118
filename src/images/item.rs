//! Per-image values as they move through the engine.
//!
//! Each phase consumes the previous phase's value and returns a new one:
//! [`ClassifiedImage`] → [`MeasuredImage`] → [`ImageCell`]. A field that a
//! later phase computes simply does not exist on the earlier type.

use crate::image_loader::LoadedImage;

/// Screenshot vs. photograph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Rendered in a full-width spanning row.
    Screenshot,
    /// Packed into the multi-column grid.
    Photograph,
}

/// An input slot: either a usable value or the placeholder for a failed image.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageEntry<T> {
    Ready(T),
    Failed(FailedImage),
}

impl<T> ImageEntry<T> {
    /// Advance a ready value to the next phase; failures pass through.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ImageEntry<U> {
        match self {
            ImageEntry::Ready(value) => ImageEntry::Ready(f(value)),
            ImageEntry::Failed(failed) => ImageEntry::Failed(failed),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ImageEntry::Ready(value) => Some(value),
            ImageEntry::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ImageEntry::Failed(_))
    }
}

/// An attachment that could not be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedImage {
    /// 1-based input position.
    pub index: usize,
    pub reason: String,
}

impl FailedImage {
    pub fn label(&self) -> String {
        format!("Error loading image {}", self.index)
    }
}

/// Decoded and classified.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedImage {
    /// 1-based input position, also the caption number.
    pub index: usize,
    pub image: LoadedImage,
    pub kind: ImageKind,
}

impl ClassifiedImage {
    /// Pixel height over pixel width. Dimensions are non-zero once decoded.
    pub fn aspect_ratio(&self) -> f64 {
        self.image.height_px as f64 / self.image.width_px as f64
    }
}

/// Classified, with its unscaled display height.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredImage {
    pub classified: ClassifiedImage,
    /// Ideal height before the global scale factor, always > 0.
    pub natural_height_in: f64,
}

impl MeasuredImage {
    pub fn index(&self) -> usize {
        self.classified.index
    }

    pub fn kind(&self) -> ImageKind {
        self.classified.kind
    }
}

/// Final renderable cell: the image at its display size plus its caption.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCell {
    pub index: usize,
    pub kind: ImageKind,
    pub image: LoadedImage,
    pub width_pt: f64,
    pub height_pt: f64,
    /// Width of the cell the image sits in; `width_pt` never exceeds it.
    pub cell_width_pt: f64,
    pub caption: String,
}
