//! # Grid Packing
//!
//! Walks items in input order and forms rows. A screenshot flushes any
//! pending photos and takes a row to itself; photos accumulate until the row
//! holds `columns` of them. Failed images take a photo slot. The scale solver
//! runs the same walk over heights, so the rows it sums are the rows that get
//! rendered.
//!
//! All rows together form one region of the document, so pagination can
//! break between rows but never inside one.

use super::item::{FailedImage, ImageCell, ImageEntry, ImageKind};

/// Caption font size in points.
pub const CAPTION_FONT_SIZE: f64 = 9.0;
/// Caption line height in points.
pub const CAPTION_LINE_HEIGHT: f64 = 10.8;
/// Gap between an image and its caption, in points.
pub const CAPTION_GAP: f64 = 2.0;
/// Vertical space a caption adds under its image, in points.
pub const CAPTION_HEIGHT_PT: f64 = CAPTION_GAP + CAPTION_LINE_HEIGHT;

/// One row as formed by [`pack_rows`], before cell padding.
#[derive(Debug, Clone, PartialEq)]
pub enum PackedRow<T> {
    /// A single item merged across every column.
    Spanning(T),
    /// One to `columns` items, left to right.
    Packed(Vec<T>),
}

/// Group items into rows, preserving order.
///
/// `spans` decides which items take a full-width row. Items never move
/// across a spanning item.
pub fn pack_rows<T>(
    items: impl IntoIterator<Item = T>,
    columns: usize,
    spans: impl Fn(&T) -> bool,
) -> Vec<PackedRow<T>> {
    let columns = columns.max(1);
    let mut rows = Vec::new();
    let mut buffer: Vec<T> = Vec::with_capacity(columns);

    for item in items {
        if spans(&item) {
            if !buffer.is_empty() {
                rows.push(PackedRow::Packed(std::mem::take(&mut buffer)));
            }
            rows.push(PackedRow::Spanning(item));
        } else {
            buffer.push(item);
            if buffer.len() == columns {
                rows.push(PackedRow::Packed(std::mem::take(&mut buffer)));
            }
        }
    }
    if !buffer.is_empty() {
        rows.push(PackedRow::Packed(buffer));
    }
    rows
}

/// Content of one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub enum GridCell {
    Image(ImageCell),
    /// Text placeholder for an image that failed to load.
    Placeholder(FailedImage),
    /// Covered by the spanning cell to its left.
    Merged,
    /// Padding at the end of a short photo row.
    Empty,
}

impl GridCell {
    pub fn index(&self) -> Option<usize> {
        match self {
            GridCell::Image(cell) => Some(cell.index),
            GridCell::Placeholder(failed) => Some(failed.index),
            GridCell::Merged | GridCell::Empty => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Spanning,
    Packed,
}

/// A rendered row. `cells.len()` always equals the column count.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub kind: RowKind,
    pub cells: Vec<GridCell>,
}

impl Row {
    /// Height of the tallest cell in points, captions included, cell padding excluded.
    pub fn content_height_pt(&self, placeholder_height_pt: f64) -> f64 {
        self.cells
            .iter()
            .map(|cell| match cell {
                GridCell::Image(image) => image.height_pt + CAPTION_HEIGHT_PT,
                GridCell::Placeholder(_) => placeholder_height_pt,
                GridCell::Merged | GridCell::Empty => 0.0,
            })
            .fold(0.0, f64::max)
    }

    /// Height of the tallest image in points, ignoring captions and placeholders.
    pub fn image_height_pt(&self) -> f64 {
        self.cells
            .iter()
            .filter_map(|cell| match cell {
                GridCell::Image(image) => Some(image.height_pt),
                _ => None,
            })
            .fold(0.0, f64::max)
    }

    /// Indices of the images in this row, left to right.
    pub fn indices(&self) -> Vec<usize> {
        self.cells.iter().filter_map(GridCell::index).collect()
    }
}

/// Lay scaled cells and placeholders into rows of exactly `columns` cells.
///
/// Failed images take a photo slot so they stay at their input position.
pub fn pack_grid(entries: Vec<ImageEntry<ImageCell>>, columns: usize) -> Vec<Row> {
    let columns = columns.max(1);
    let spans = |entry: &ImageEntry<ImageCell>| {
        matches!(entry, ImageEntry::Ready(cell) if cell.kind == ImageKind::Screenshot)
    };

    pack_rows(entries, columns, spans)
        .into_iter()
        .map(|row| match row {
            PackedRow::Spanning(entry) => {
                let mut cells = Vec::with_capacity(columns);
                cells.push(into_cell(entry));
                cells.resize(columns, GridCell::Merged);
                Row {
                    kind: RowKind::Spanning,
                    cells,
                }
            }
            PackedRow::Packed(entries) => {
                let mut cells: Vec<GridCell> = entries.into_iter().map(into_cell).collect();
                cells.resize(columns, GridCell::Empty);
                Row {
                    kind: RowKind::Packed,
                    cells,
                }
            }
        })
        .collect()
}

fn into_cell(entry: ImageEntry<ImageCell>) -> GridCell {
    match entry {
        ImageEntry::Ready(cell) => GridCell::Image(cell),
        ImageEntry::Failed(failed) => GridCell::Placeholder(failed),
    }
}
