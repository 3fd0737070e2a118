//! # Layout Engine
//!
//! Flows a flat list of blocks onto pages. Two passes share the same block
//! heights:
//!
//! 1. [`measure_blocks`] sums the height of the text sections without
//!    producing pages, so the caller knows how much room the images get.
//! 2. [`LayoutEngine::layout`] places every block, breaking paragraphs
//!    between lines and moving image rows to the next page whole.
//!
//! Coordinates are in points with the origin at the top-left of the page;
//! the PDF writer flips them.

pub mod page_break;

use crate::font::StandardFont;
use crate::image_loader::LoadedImage;
use crate::images::grid::{GridCell, Row, RowKind, CAPTION_FONT_SIZE, CAPTION_GAP, CAPTION_LINE_HEIGHT};
use crate::model::PageConfig;
use crate::text::break_into_lines;

use page_break::{decide_break, BreakDecision, BreakRules};

/// Line height as a multiple of font size when a paragraph sets none.
const DEFAULT_LEADING: f64 = 1.2;

/// Helvetica ascender, as a fraction of the font size.
const ASCENT: f64 = 0.718;

/// An RGB color with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    /// #333333
    pub const CHARCOAL: Color = Color { r: 0.2, g: 0.2, b: 0.2 };
    /// #444444
    pub const DARK_GREY: Color = Color { r: 0.267, g: 0.267, b: 0.267 };
    /// #666666
    pub const GREY: Color = Color { r: 0.4, g: 0.4, b: 0.4 };
    /// #CCCCCC
    pub const LIGHT_GREY: Color = Color { r: 0.8, g: 0.8, b: 0.8 };
    /// #CC0000
    pub const ERROR_RED: Color = Color { r: 0.8, g: 0.0, b: 0.0 };
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// A run of wrapped text in one font.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub font: StandardFont,
    pub font_size: f64,
    /// Distance between baselines in points.
    pub line_height: f64,
    pub color: Color,
    /// Extra space below the last line.
    pub space_after: f64,
    /// Left indent in points.
    pub indent: f64,
    /// Marker drawn in the indent on the first line, e.g. a bullet.
    pub marker: Option<String>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, font: StandardFont, font_size: f64) -> Self {
        Self {
            text: text.into(),
            font,
            font_size,
            line_height: font_size * DEFAULT_LEADING,
            color: Color::BLACK,
            space_after: 0.0,
            indent: 0.0,
            marker: None,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_space_after(mut self, space_after: f64) -> Self {
        self.space_after = space_after;
        self
    }

    pub fn with_line_height(mut self, line_height: f64) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>, indent: f64) -> Self {
        self.marker = Some(marker.into());
        self.indent = indent;
        self
    }

    fn lines(&self, width: f64) -> Vec<crate::text::BrokenLine> {
        break_into_lines(&self.text, self.font, self.font_size, (width - self.indent).max(1.0))
    }

    /// Total height including `space_after`.
    pub fn height(&self, width: f64) -> f64 {
        self.lines(width).len() as f64 * self.line_height + self.space_after
    }
}

/// One grid row from the image engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRowBlock {
    pub row: Row,
    /// Vertical padding of the row (top + bottom) in points.
    pub cell_padding_pt: f64,
    pub placeholder_height_pt: f64,
}

impl ImageRowBlock {
    pub fn height(&self) -> f64 {
        self.row.content_height_pt(self.placeholder_height_pt) + self.cell_padding_pt
    }
}

/// A unit of flowing content.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Vertical space; dropped at the top of a page.
    Spacer(f64),
    /// Full-width horizontal line.
    Rule { thickness: f64, color: Color },
    Paragraph(Paragraph),
    /// Never split across pages.
    ImageRow(ImageRowBlock),
}

impl Block {
    /// Height of the block in an unbroken flow `width` points wide.
    pub fn height(&self, width: f64) -> f64 {
        match self {
            Block::Spacer(h) => *h,
            Block::Rule { thickness, .. } => *thickness,
            Block::Paragraph(p) => p.height(width),
            Block::ImageRow(r) => r.height(),
        }
    }
}

/// Height of `blocks` laid end to end, in points. No pages are produced.
pub fn measure_blocks(blocks: &[Block], width: f64) -> f64 {
    blocks.iter().map(|b| b.height(width)).sum()
}

/// A fully laid-out page.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    /// Top-left x, in points from the page's left edge.
    pub x: f64,
    /// Top-left y, in points from the page's top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
}

/// A line of text at an absolute position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: f64,
    /// Baseline, from the top of the page.
    pub y: f64,
    pub width: f64,
    pub text: String,
}

/// What to draw for an element.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Text {
        lines: Vec<TextLine>,
        font: StandardFont,
        font_size: f64,
        color: Color,
    },
    /// Horizontal line across the element's width.
    Rule { thickness: f64, color: Color },
    /// An image scaled to the element's box.
    Image { image: LoadedImage },
    /// Red notice in place of an image that failed to load.
    Placeholder { text: String, font_size: f64 },
}

/// Flows blocks onto pages.
pub struct LayoutEngine {
    rules: BreakRules,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

struct PageCursor {
    page: PageConfig,
    pages: Vec<LayoutPage>,
    elements: Vec<LayoutElement>,
    y: f64,
    /// Nothing placed on the current page yet.
    fresh: bool,
}

impl PageCursor {
    fn new(page: PageConfig) -> Self {
        Self {
            page,
            pages: Vec::new(),
            elements: Vec::new(),
            y: page.margin.top,
            fresh: true,
        }
    }

    fn left(&self) -> f64 {
        self.page.margin.left
    }

    fn width(&self) -> f64 {
        self.page.content_width()
    }

    fn remaining(&self) -> f64 {
        self.page.size.dimensions().1 - self.page.margin.bottom - self.y
    }

    fn push(&mut self, element: LayoutElement) {
        self.elements.push(element);
        self.fresh = false;
    }

    fn new_page(&mut self) {
        let (width, height) = self.page.size.dimensions();
        self.pages.push(LayoutPage {
            width,
            height,
            elements: std::mem::take(&mut self.elements),
        });
        self.y = self.page.margin.top;
        self.fresh = true;
    }

    fn finish(mut self) -> Vec<LayoutPage> {
        if !self.elements.is_empty() || self.pages.is_empty() {
            self.new_page();
        }
        self.pages
    }
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            rules: BreakRules::default(),
        }
    }

    /// Place `blocks` onto pages of the given configuration. Always returns
    /// at least one page.
    pub fn layout(&self, blocks: Vec<Block>, page: &PageConfig) -> Vec<LayoutPage> {
        let mut cursor = PageCursor::new(*page);
        for block in blocks {
            match block {
                Block::Spacer(h) => {
                    if cursor.fresh {
                        continue;
                    }
                    if h > cursor.remaining() {
                        cursor.new_page();
                    } else {
                        cursor.y += h;
                    }
                }
                Block::Rule { thickness, color } => {
                    self.place_unbreakable(&mut cursor, thickness);
                    let element = LayoutElement {
                        x: cursor.left(),
                        y: cursor.y,
                        width: cursor.width(),
                        height: thickness,
                        draw: DrawCommand::Rule { thickness, color },
                    };
                    cursor.push(element);
                    cursor.y += thickness;
                }
                Block::Paragraph(paragraph) => self.layout_paragraph(&mut cursor, paragraph),
                Block::ImageRow(row) => {
                    self.place_unbreakable(&mut cursor, row.height());
                    layout_image_row(&mut cursor, row);
                }
            }
        }
        let pages = cursor.finish();
        log::debug!("Laid out {} page(s)", pages.len());
        pages
    }

    /// Start a new page if a block of `height` does not fit on this one.
    fn place_unbreakable(&self, cursor: &mut PageCursor, height: f64) {
        let decision = decide_break(cursor.remaining(), &[height], false, self.rules, cursor.fresh);
        if decision == BreakDecision::MoveToNextPage {
            cursor.new_page();
        }
    }

    fn layout_paragraph(&self, cursor: &mut PageCursor, paragraph: Paragraph) {
        let lines = paragraph.lines(cursor.width());
        let heights = vec![paragraph.line_height; lines.len()];
        let mut start = 0;

        while start < lines.len() {
            let decision = decide_break(
                cursor.remaining(),
                &heights[start..],
                true,
                self.rules,
                cursor.fresh,
            );
            let end = match decision {
                BreakDecision::Place => lines.len(),
                BreakDecision::Split {
                    items_on_current_page,
                } => start + items_on_current_page,
                BreakDecision::MoveToNextPage => {
                    cursor.new_page();
                    continue;
                }
            };

            let x = cursor.left() + paragraph.indent;
            let top = cursor.y;
            let baseline_offset =
                (paragraph.line_height - paragraph.font_size) / 2.0 + paragraph.font_size * ASCENT;
            let mut text_lines: Vec<TextLine> = lines[start..end]
                .iter()
                .enumerate()
                .map(|(i, line)| TextLine {
                    x,
                    y: top + i as f64 * paragraph.line_height + baseline_offset,
                    width: line.width,
                    text: line.text.clone(),
                })
                .collect();
            if start == 0 {
                if let Some(marker) = &paragraph.marker {
                    text_lines.insert(
                        0,
                        TextLine {
                            x: cursor.left(),
                            y: top + baseline_offset,
                            width: paragraph.font.measure_string(marker, paragraph.font_size),
                            text: marker.clone(),
                        },
                    );
                }
            }

            let height = (end - start) as f64 * paragraph.line_height;
            let element = LayoutElement {
                x: cursor.left(),
                y: top,
                width: cursor.width(),
                height,
                draw: DrawCommand::Text {
                    lines: text_lines,
                    font: paragraph.font,
                    font_size: paragraph.font_size,
                    color: paragraph.color,
                },
            };
            cursor.push(element);
            cursor.y += height;

            if end < lines.len() {
                cursor.new_page();
            }
            start = end;
        }
        cursor.y += paragraph.space_after;
    }
}

/// Emit the images, captions, and placeholders of one row at the cursor.
fn layout_image_row(cursor: &mut PageCursor, block: ImageRowBlock) {
    let columns = block.row.cells.len().max(1);
    let slot_width = match block.row.kind {
        RowKind::Spanning => cursor.width(),
        RowKind::Packed => cursor.width() / columns as f64,
    };
    let half_pad = block.cell_padding_pt / 2.0;
    let top = cursor.y + half_pad;
    let row_height = block.height();
    let left = cursor.left();

    for (i, cell) in block.row.cells.into_iter().enumerate() {
        let slot_x = left + i as f64 * cursor.width() / columns as f64;
        match cell {
            GridCell::Image(cell) => {
                let x = slot_x + (slot_width - cell.width_pt) / 2.0;
                cursor.push(LayoutElement {
                    x,
                    y: top,
                    width: cell.width_pt,
                    height: cell.height_pt,
                    draw: DrawCommand::Image { image: cell.image },
                });

                let caption_width = StandardFont::Helvetica.measure_string(&cell.caption, CAPTION_FONT_SIZE);
                let caption_top = top + cell.height_pt + CAPTION_GAP;
                cursor.push(LayoutElement {
                    x: slot_x,
                    y: caption_top,
                    width: slot_width,
                    height: CAPTION_LINE_HEIGHT,
                    draw: DrawCommand::Text {
                        lines: vec![TextLine {
                            x: slot_x + (slot_width - caption_width) / 2.0,
                            y: caption_top
                                + (CAPTION_LINE_HEIGHT - CAPTION_FONT_SIZE) / 2.0
                                + CAPTION_FONT_SIZE * ASCENT,
                            width: caption_width,
                            text: cell.caption,
                        }],
                        font: StandardFont::Helvetica,
                        font_size: CAPTION_FONT_SIZE,
                        color: Color::GREY,
                    },
                });
            }
            GridCell::Placeholder(failed) => {
                cursor.push(LayoutElement {
                    x: slot_x,
                    y: top,
                    width: slot_width,
                    height: block.placeholder_height_pt,
                    draw: DrawCommand::Placeholder {
                        text: failed.label(),
                        font_size: CAPTION_FONT_SIZE,
                    },
                });
            }
            GridCell::Merged | GridCell::Empty => {}
        }
    }
    cursor.y += row_height;
}
