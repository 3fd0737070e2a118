//! Natural (unscaled) display heights.
//!
//! An image's natural height is the height it takes at the full width of its
//! cell, capped at the ideal height for its kind so that one very tall image
//! cannot dominate the scale computation.

use super::item::{ClassifiedImage, ImageKind, MeasuredImage};
use super::ImageLayoutConfig;

/// Points per inch.
pub const PT_PER_IN: f64 = 72.0;

/// Cells never get narrower than this, whatever the page geometry.
const MIN_CELL_WIDTH_IN: f64 = 0.25;

/// Horizontal geometry of the image grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellGeometry {
    pub content_width_in: f64,
    pub columns: usize,
    pub cell_padding_in: f64,
}

impl CellGeometry {
    pub fn new(content_width_in: f64, columns: usize, cell_padding_in: f64) -> Self {
        Self {
            content_width_in,
            columns: columns.max(1),
            cell_padding_in,
        }
    }

    /// Usable width of one photo column.
    pub fn photo_width_in(&self) -> f64 {
        (self.content_width_in / self.columns as f64 - self.cell_padding_in).max(MIN_CELL_WIDTH_IN)
    }

    /// Usable width of a row merged across all columns.
    pub fn spanning_width_in(&self) -> f64 {
        (self.content_width_in - self.cell_padding_in).max(MIN_CELL_WIDTH_IN)
    }

    pub fn width_for(&self, kind: ImageKind) -> f64 {
        match kind {
            ImageKind::Screenshot => self.spanning_width_in(),
            ImageKind::Photograph => self.photo_width_in(),
        }
    }
}

/// `min(cell width × aspect, ideal height)` for the image's kind.
pub fn natural_height_in(
    image: &ClassifiedImage,
    geometry: &CellGeometry,
    config: &ImageLayoutConfig,
) -> f64 {
    let ideal = match image.kind {
        ImageKind::Screenshot => config.screenshot_ideal_height_in,
        ImageKind::Photograph => config.photo_ideal_height_in,
    };
    (geometry.width_for(image.kind) * image.aspect_ratio()).min(ideal)
}

pub fn measure(
    image: ClassifiedImage,
    geometry: &CellGeometry,
    config: &ImageLayoutConfig,
) -> MeasuredImage {
    let natural_height_in = natural_height_in(&image, geometry, config);
    MeasuredImage {
        classified: image,
        natural_height_in,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::fixtures::classified;

    fn letter_geometry() -> CellGeometry {
        CellGeometry::new(7.0, 2, 12.0 / 72.0)
    }

    #[test]
    fn test_cell_widths() {
        let g = letter_geometry();
        assert!((g.photo_width_in() - (3.5 - 1.0 / 6.0)).abs() < 1e-9);
        assert!((g.spanning_width_in() - (7.0 - 1.0 / 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_columns_treated_as_one() {
        let g = CellGeometry::new(7.0, 0, 0.0);
        assert_eq!(g.columns, 1);
        assert!((g.photo_width_in() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_landscape_photo_uses_width() {
        let config = ImageLayoutConfig::default();
        let img = classified(400, 300, ImageKind::Photograph);
        let h = natural_height_in(&img, &letter_geometry(), &config);
        // (3.5 - 1/6) * 0.75 = 2.5, exactly the photo ideal
        assert!((h - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_wide_photo_below_ideal() {
        let config = ImageLayoutConfig::default();
        let img = classified(1000, 250, ImageKind::Photograph);
        let h = natural_height_in(&img, &letter_geometry(), &config);
        assert!((h - (3.5 - 1.0 / 6.0) * 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_tall_screenshot_capped_at_ideal() {
        let config = ImageLayoutConfig::default();
        let img = classified(1170, 2532, ImageKind::Screenshot);
        let h = natural_height_in(&img, &letter_geometry(), &config);
        assert_eq!(h, config.screenshot_ideal_height_in);
    }

    #[test]
    fn test_measure_keeps_identity() {
        let config = ImageLayoutConfig::default();
        let mut img = classified(300, 300, ImageKind::Photograph);
        img.index = 4;
        let m = measure(img, &letter_geometry(), &config);
        assert_eq!(m.index(), 4);
        assert_eq!(m.kind(), ImageKind::Photograph);
        assert!(m.natural_height_in > 0.0);
    }
}
