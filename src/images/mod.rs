//! # Adaptive Image Grid
//!
//! Fits an unpredictable set of attachments into the vertical space the rest
//! of the report has left.
//!
//! ```text
//! raw bytes ─→ [classify] ─→ [measure] ─→ [scale] ─→ [apply] ─→ [grid] ─→ rows
//!               screenshot    natural      one global   floor +    spanning /
//!               or photo      height       factor       width cap  packed rows
//! ```
//!
//! Screenshots get a full-width row so their text stays readable; photos
//! share rows `columns` at a time. A single scale factor shrinks everything
//! uniformly to fit the budget, after which each image is clamped back up to
//! a legibility floor. The floor wins over the budget: with many images the
//! grid can end up taller than requested, and [`ImageSection::overflows_budget`]
//! reports when it does.
//!
//! One bad attachment never stops the others. It becomes a text placeholder
//! at its original position and keeps its caption number.

pub mod apply;
pub mod classify;
pub mod grid;
pub mod item;
pub mod measure;
pub mod scale;

use serde::{Deserialize, Serialize};

use crate::font::StandardFont;
use crate::layout::{Block, Color, ImageRowBlock, Paragraph};

use grid::Row;
use measure::{CellGeometry, PT_PER_IN};

/// Budgets are never solved against less than this, whatever the config says.
const MIN_POSITIVE_BUDGET_IN: f64 = 0.01;

/// Divider line above the section heading, in points.
const HEADER_RULE_PT: f64 = 1.0;

/// Tunable constants of the image engine. Every field has a default, so a
/// report only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageLayoutConfig {
    /// Photo columns per row.
    pub columns: usize,
    /// Ideal height of a screenshot when space is unlimited.
    pub screenshot_ideal_height_in: f64,
    /// Screenshots never render shorter than this.
    pub screenshot_min_height_in: f64,
    /// Ideal height of a photo row.
    pub photo_ideal_height_in: f64,
    /// Photos never render shorter than this.
    pub photo_min_height_in: f64,
    /// Height of the divider and heading above the grid. Raised to the
    /// heading's own height when set lower.
    pub section_header_overhead_in: f64,
    /// Vertical padding per row (top + bottom), also subtracted from cell width.
    pub cell_padding_in: f64,
    /// Height reserved for a failed image's placeholder text.
    pub placeholder_height_in: f64,
    /// Smallest budget the solver accepts.
    pub min_budget_in: f64,
    /// Fraction of the budget the solver aims for when shrinking.
    pub safety_margin: f64,
    /// Heading printed above the grid.
    pub section_title: String,
}

impl Default for ImageLayoutConfig {
    fn default() -> Self {
        Self {
            columns: 2,
            screenshot_ideal_height_in: 4.0,
            screenshot_min_height_in: 1.5,
            photo_ideal_height_in: 2.5,
            photo_min_height_in: 0.8,
            section_header_overhead_in: 0.5,
            cell_padding_in: 12.0 / PT_PER_IN,
            placeholder_height_in: 0.3,
            min_budget_in: 1.0,
            safety_margin: 0.97,
            section_title: "Attached Images".to_string(),
        }
    }
}

/// Input to one layout invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutBudget {
    /// Vertical space left on the page after the preceding sections.
    pub available_height_in: f64,
    pub columns: usize,
    pub cell_padding_in: f64,
    pub section_header_overhead_in: f64,
}

impl LayoutBudget {
    /// Budget for the space remaining after the measured sections.
    pub fn from_remaining(available_height_in: f64, config: &ImageLayoutConfig) -> Self {
        Self {
            available_height_in,
            columns: config.columns.max(1),
            cell_padding_in: config.cell_padding_in,
            section_header_overhead_in: config.section_header_overhead_in,
        }
    }

    /// Height the rows themselves may use: the available height minus the
    /// header overhead, clamped to a positive floor on both sides.
    pub fn solving_height_in(&self, min_budget_in: f64) -> f64 {
        let floor = min_budget_in.max(MIN_POSITIVE_BUDGET_IN);
        let available = self.available_height_in.max(floor);
        (available - self.section_header_overhead_in).max(floor)
    }
}

/// The engine's output: rows in input order plus the numbers behind them.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSection {
    pub rows: Vec<Row>,
    /// Global scale factor, in (0, 1].
    pub scale: f64,
    /// Height the solver fit the rows into.
    pub budget_in: f64,
    pub cell_padding_in: f64,
    pub placeholder_height_in: f64,
    /// Divider, heading and spacing above the rows.
    pub header: Vec<Block>,
    /// Height of `header`, subtracted from the available height before solving.
    pub header_height_in: f64,
}

impl ImageSection {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Realized height of the rows as the page flow lays them out:
    /// tallest cell with its caption, plus padding.
    pub fn projected_height_in(&self) -> f64 {
        let placeholder_pt = self.placeholder_height_in * PT_PER_IN;
        self.rows
            .iter()
            .map(|row| row.content_height_pt(placeholder_pt) / PT_PER_IN + self.cell_padding_in)
            .sum()
    }

    /// True when legibility floors pushed the rows past the budget.
    pub fn overflows_budget(&self) -> bool {
        self.projected_height_in() > self.budget_in + 1e-9
    }

    /// Divider, heading, and one block per row, ready for the page flow.
    /// An empty section produces nothing, not even the heading.
    pub fn into_blocks(self) -> Vec<Block> {
        if self.rows.is_empty() {
            return vec![];
        }
        let padding_pt = self.cell_padding_in * PT_PER_IN;
        let placeholder_pt = self.placeholder_height_in * PT_PER_IN;

        let mut blocks = self.header;
        blocks.extend(self.rows.into_iter().map(|row| {
            Block::ImageRow(ImageRowBlock {
                row,
                cell_padding_pt: padding_pt,
                placeholder_height_pt: placeholder_pt,
            })
        }));
        blocks
    }
}

/// Runs the classify → measure → scale → apply → grid pipeline.
pub struct ImageGrid {
    content_width_in: f64,
    config: ImageLayoutConfig,
}

impl ImageGrid {
    pub fn new(content_width_in: f64, config: ImageLayoutConfig) -> Self {
        Self {
            content_width_in,
            config,
        }
    }

    pub fn config(&self) -> &ImageLayoutConfig {
        &self.config
    }

    /// Divider and heading filling `overhead_in`, or their natural height
    /// when that is more.
    fn header_blocks(&self, overhead_in: f64) -> (Vec<Block>, f64) {
        let heading = Paragraph::new(
            self.config.section_title.clone(),
            StandardFont::HelveticaBold,
            12.0,
        )
        .with_color(Color::DARK_GREY)
        .with_space_after(6.0);
        let fixed_pt = HEADER_RULE_PT + heading.height(self.content_width_in * PT_PER_IN);
        let height_pt = (overhead_in * PT_PER_IN).max(fixed_pt);
        let gap = height_pt - fixed_pt;

        let blocks = vec![
            Block::Spacer(gap * 0.36),
            Block::Rule {
                thickness: HEADER_RULE_PT,
                color: Color::LIGHT_GREY,
            },
            Block::Spacer(gap * 0.36),
            Block::Paragraph(heading),
            Block::Spacer(gap * 0.28),
        ];
        (blocks, height_pt / PT_PER_IN)
    }

    /// Lay out `images` (in caption order) within `budget`.
    ///
    /// Each buffer is consumed as it is decoded. Pure with respect to its
    /// inputs: the same images and budget always give the same section.
    pub fn build(&self, images: Vec<Vec<u8>>, budget: &LayoutBudget) -> ImageSection {
        let (header, header_height_in) = self.header_blocks(budget.section_header_overhead_in);
        let budget_in = LayoutBudget {
            section_header_overhead_in: header_height_in,
            ..*budget
        }
        .solving_height_in(self.config.min_budget_in);
        let mut section = ImageSection {
            rows: vec![],
            scale: 1.0,
            budget_in,
            cell_padding_in: budget.cell_padding_in,
            placeholder_height_in: self.config.placeholder_height_in,
            header,
            header_height_in,
        };
        if images.is_empty() {
            return section;
        }

        let geometry = CellGeometry::new(
            self.content_width_in,
            budget.columns,
            budget.cell_padding_in,
        );

        let measured: Vec<_> = images
            .into_iter()
            .enumerate()
            .map(|(i, bytes)| {
                classify::classify(i + 1, bytes)
                    .map(|image| measure::measure(image, &geometry, &self.config))
            })
            .collect();

        let overhead =
            scale::RowOverhead::new(budget.cell_padding_in, self.config.placeholder_height_in);
        let total = scale::total_natural_height(&measured, geometry.columns, &overhead);
        let factor = scale::solve_scale(total, budget_in, self.config.safety_margin);
        log::debug!(
            "Image grid: natural height {:.3}in + {:.3}in fixed, budget {:.3}in, scale {:.4}",
            total.natural_in,
            total.fixed_in,
            budget_in,
            factor
        );

        let cells: Vec<_> = measured
            .into_iter()
            .map(|entry| {
                entry.map(|m| apply::apply_scale(m, factor, &geometry, &self.config))
            })
            .collect();
        let failed = cells.iter().filter(|c| c.is_failed()).count();

        section.rows = grid::pack_grid(cells, geometry.columns);
        section.scale = factor;

        if section.overflows_budget() {
            log::warn!(
                "Image grid needs {:.3}in but budget is {:.3}in: legibility floors take priority",
                section.projected_height_in(),
                budget_in
            );
        }
        log::info!(
            "Laid out {} rows ({} failed images) at scale {:.4}",
            section.rows.len(),
            failed,
            factor
        );
        section
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use grid::{GridCell, RowKind};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            width,
            height,
            image::ColorType::Rgb8,
        )
        .unwrap();
        buf
    }

    fn grid() -> ImageGrid {
        ImageGrid::new(7.0, ImageLayoutConfig::default())
    }

    #[test]
    fn test_solving_height_subtracts_overhead() {
        let budget = LayoutBudget::from_remaining(3.0, &ImageLayoutConfig::default());
        assert!((budget.solving_height_in(1.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_negative_budget_clamped() {
        let budget = LayoutBudget::from_remaining(-4.0, &ImageLayoutConfig::default());
        assert_eq!(budget.solving_height_in(1.0), 1.0);
        assert_eq!(budget.solving_height_in(0.0), MIN_POSITIVE_BUDGET_IN);
    }

    #[test]
    fn test_empty_input_yields_no_blocks() {
        let budget = LayoutBudget::from_remaining(5.0, grid().config());
        let section = grid().build(vec![], &budget);
        assert!(section.is_empty());
        assert_eq!(section.scale, 1.0);
        assert!(section.into_blocks().is_empty());
    }

    #[test]
    fn test_three_photos_shrink_into_small_budget() {
        let budget = LayoutBudget::from_remaining(3.0, grid().config());
        let section = grid().build(vec![png(40, 30), png(40, 30), png(40, 30)], &budget);

        assert_eq!(section.rows.len(), 2);
        assert_eq!(section.rows[0].indices(), vec![1, 2]);
        assert_eq!(section.rows[1].indices(), vec![3]);
        assert_eq!(section.rows[1].cells[1], GridCell::Empty);

        // two rows of 2.5in natural height against 2.5in, padding and captions unscaled
        let fixed = 2.0 * (12.0 + grid::CAPTION_HEIGHT_PT) / 72.0;
        let expected = (2.5 * 0.97 - fixed) / 5.0;
        assert!((section.scale - expected).abs() < 1e-9);
        assert!((section.projected_height_in() - 2.5 * 0.97).abs() < 1e-9);
        assert!(!section.overflows_budget());
    }

    #[test]
    fn test_three_photos_fit_large_budget() {
        let budget = LayoutBudget::from_remaining(8.0, grid().config());
        let section = grid().build(vec![png(40, 30), png(40, 30), png(40, 30)], &budget);
        assert_eq!(section.scale, 1.0);
        assert!(!section.overflows_budget());
    }

    #[test]
    fn test_screenshot_takes_spanning_row() {
        let budget = LayoutBudget::from_remaining(9.0, grid().config());
        // 90x195 is ratio 0.4615, exactly 9/19.5
        let section = grid().build(vec![png(40, 30), png(90, 195), png(40, 30)], &budget);
        let kinds: Vec<_> = section.rows.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![RowKind::Packed, RowKind::Spanning, RowKind::Packed]);
        assert_eq!(section.rows[1].cells[1], GridCell::Merged);
    }

    #[test]
    fn test_corrupt_image_becomes_placeholder_in_place() {
        let budget = LayoutBudget::from_remaining(9.0, grid().config());
        let section = grid().build(
            vec![png(40, 30), b"not an image".to_vec(), png(40, 30)],
            &budget,
        );
        assert_eq!(section.rows.len(), 2);
        assert_eq!(section.rows[0].indices(), vec![1, 2]);
        assert!(matches!(
            &section.rows[0].cells[1],
            GridCell::Placeholder(f) if f.index == 2
        ));
        assert_eq!(section.rows[1].indices(), vec![3]);
    }

    #[test]
    fn test_floor_overflow_is_reported_not_fixed() {
        let budget = LayoutBudget::from_remaining(1.5, grid().config());
        let images = (0..12).map(|_| png(30, 30)).collect();
        let section = grid().build(images, &budget);
        assert!(section.scale < 1.0);
        assert!(section.overflows_budget());
        for row in &section.rows {
            assert!(row.image_height_pt() + 1e-9 >= 0.8 * PT_PER_IN);
        }
    }

    #[test]
    fn test_into_blocks_has_header_then_rows() {
        let budget = LayoutBudget::from_remaining(9.0, grid().config());
        let section = grid().build(vec![png(40, 30)], &budget);
        let blocks = section.into_blocks();
        assert_eq!(blocks.len(), 6);
        assert!(matches!(&blocks[3], Block::Paragraph(p) if p.text == "Attached Images"));
        assert!(matches!(blocks[5], Block::ImageRow(_)));
    }

    #[test]
    fn test_header_fills_configured_overhead() {
        let budget = LayoutBudget::from_remaining(9.0, grid().config());
        let section = grid().build(vec![png(40, 30)], &budget);
        assert!((section.header_height_in - 0.5).abs() < 1e-12);
        let header_pt = crate::layout::measure_blocks(&section.header, 7.0 * PT_PER_IN);
        assert!((header_pt - 0.5 * PT_PER_IN).abs() < 1e-9);
        assert!((section.budget_in - 8.5).abs() < 1e-12);
    }

    #[test]
    fn test_header_never_shorter_than_heading() {
        let config = ImageLayoutConfig {
            section_header_overhead_in: 0.0,
            ..ImageLayoutConfig::default()
        };
        let grid = ImageGrid::new(7.0, config);
        let budget = LayoutBudget::from_remaining(9.0, grid.config());
        let section = grid.build(vec![png(40, 30)], &budget);
        // rule + one 12pt line at 1.2 leading + 6pt after
        let expected_pt = 1.0 + 14.4 + 6.0;
        assert!((section.header_height_in * PT_PER_IN - expected_pt).abs() < 1e-9);
        assert!((section.budget_in - (9.0 - expected_pt / PT_PER_IN)).abs() < 1e-9);
    }

    #[test]
    fn test_projection_counts_captions_and_placeholders() {
        let budget = LayoutBudget::from_remaining(9.0, grid().config());
        let section = grid().build(vec![b"junk".to_vec(), b"junk".to_vec(), png(40, 30)], &budget);
        assert_eq!(section.rows.len(), 2);
        let pad = 12.0 / 72.0;
        let image_row = section.rows[1].image_height_pt() / PT_PER_IN;
        let expected = (0.3 + pad) + (image_row + grid::CAPTION_HEIGHT_PT / PT_PER_IN + pad);
        assert!((section.projected_height_in() - expected).abs() < 1e-9);
    }
}
