//! # Scale Solver
//!
//! Sums the height of the grid as it will be packed and derives one global
//! scale factor that fits the height budget. Each row has a part the factor
//! shrinks (the tallest natural image height) and a part it cannot (cell
//! padding and the caption line, or a placeholder line for a row of failed
//! images):
//!
//! ```text
//! natural = Σ rows tallest natural height
//! fixed   = Σ rows (padding + caption)
//! scale   = 1.0                                    if natural + fixed ≤ budget
//!         = (budget × safety − fixed) / natural    otherwise
//! ```
//!
//! The safety margin (0.97 by default) absorbs rounding so the last row does
//! not tip onto a new page. Failed images hold their slot in the row walk but
//! add no natural height.

use super::grid::{pack_rows, PackedRow, CAPTION_HEIGHT_PT};
use super::item::{ImageEntry, ImageKind, MeasuredImage};
use super::measure::PT_PER_IN;

/// Scale used when the fixed row overhead alone fills the budget. Floors
/// decide the final heights in that case.
const MIN_SCALE: f64 = 1e-3;

/// Per-row space the scale factor does not touch, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowOverhead {
    pub cell_padding_in: f64,
    pub caption_in: f64,
    pub placeholder_in: f64,
}

impl RowOverhead {
    pub fn new(cell_padding_in: f64, placeholder_in: f64) -> Self {
        Self {
            cell_padding_in,
            caption_in: CAPTION_HEIGHT_PT / PT_PER_IN,
            placeholder_in,
        }
    }
}

/// Height of one simulated row, or of a whole grid when summed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RowHeight {
    /// Shrinks with the scale factor.
    pub natural_in: f64,
    /// Padding, captions and placeholders.
    pub fixed_in: f64,
}

impl RowHeight {
    pub fn total_in(&self) -> f64 {
        self.natural_in + self.fixed_in
    }
}

/// Row heights in inches, in render order.
pub fn simulate_row_heights(
    entries: &[ImageEntry<MeasuredImage>],
    columns: usize,
    overhead: &RowOverhead,
) -> Vec<RowHeight> {
    let spans = |entry: &&ImageEntry<MeasuredImage>| {
        matches!(entry, ImageEntry::Ready(m) if m.kind() == ImageKind::Screenshot)
    };
    pack_rows(entries.iter(), columns, spans)
        .into_iter()
        .map(|row| {
            let members = match row {
                PackedRow::Spanning(entry) => vec![entry],
                PackedRow::Packed(entries) => entries,
            };
            let tallest = members
                .iter()
                .filter_map(|entry| entry.ready())
                .map(|m| m.natural_height_in)
                .fold(None, |acc: Option<f64>, h| Some(acc.map_or(h, |a| a.max(h))));
            match tallest {
                Some(natural_in) => RowHeight {
                    natural_in,
                    fixed_in: overhead.cell_padding_in + overhead.caption_in,
                },
                None => RowHeight {
                    natural_in: 0.0,
                    fixed_in: overhead.cell_padding_in + overhead.placeholder_in,
                },
            }
        })
        .collect()
}

/// Height of the packed grid at scale 1.0.
pub fn total_natural_height(
    entries: &[ImageEntry<MeasuredImage>],
    columns: usize,
    overhead: &RowOverhead,
) -> RowHeight {
    simulate_row_heights(entries, columns, overhead)
        .into_iter()
        .fold(RowHeight::default(), |sum, row| RowHeight {
            natural_in: sum.natural_in + row.natural_in,
            fixed_in: sum.fixed_in + row.fixed_in,
        })
}

/// Scale factor in (0, 1] for a grid height against a budget.
///
/// `budget_in` must already be clamped to a positive floor.
pub fn solve_scale(total: RowHeight, budget_in: f64, safety_margin: f64) -> f64 {
    let RowHeight {
        natural_in,
        fixed_in,
    } = total;
    if natural_in.is_nan() || natural_in <= 0.0 || total.total_in() <= budget_in {
        return 1.0;
    }
    let scale = (budget_in * safety_margin - fixed_in) / natural_in;
    if scale.is_nan() {
        1.0
    } else {
        scale.clamp(MIN_SCALE, 1.0)
    }
}
