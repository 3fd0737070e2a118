//! # Report Pipeline
//!
//! The two-pass contract between the text sections and the image grid:
//!
//! ```text
//! Report ─→ text blocks ─→ measure_blocks ─→ remaining height
//!                                                   ↓
//!           attachments ─→ ImageGrid::build(budget) ─→ image blocks
//!                                                   ↓
//!                  text blocks + image blocks ─→ LayoutEngine ─→ PdfWriter
//! ```
//!
//! The text is measured before any image is looked at, and the grid is
//! built exactly once against what is left.

use crate::error::PagefitError;
use crate::font::StandardFont;
use crate::image_loader::read_source_bytes;
use crate::images::measure::PT_PER_IN;
use crate::images::{ImageGrid, LayoutBudget};
use crate::layout::{measure_blocks, Block, Color, LayoutEngine, Paragraph};
use crate::model::{Report, Section};
use crate::pdf::PdfWriter;
use crate::text::normalize_fullwidth;

const TITLE_SIZE: f64 = 20.0;
const SUBTITLE_SIZE: f64 = 14.0;
const HEADING_SIZE: f64 = 12.0;
const BODY_SIZE: f64 = 11.0;
const BODY_LEADING: f64 = 14.0;
const BULLET_INDENT: f64 = 12.0;

/// Text blocks for the title, subtitle, and sections, in reading order.
pub fn build_text_blocks(report: &Report) -> Vec<Block> {
    let mut blocks = vec![Block::Paragraph(
        Paragraph::new(normalize_fullwidth(&report.title), StandardFont::HelveticaBold, TITLE_SIZE)
            .with_color(Color::CHARCOAL)
            .with_space_after(4.0),
    )];
    if let Some(subtitle) = &report.subtitle {
        blocks.push(Block::Paragraph(
            Paragraph::new(normalize_fullwidth(subtitle), StandardFont::Helvetica, SUBTITLE_SIZE)
                .with_color(Color::GREY)
                .with_space_after(6.0),
        ));
    }
    for section in &report.sections {
        push_section(&mut blocks, section);
    }
    blocks
}

fn push_section(blocks: &mut Vec<Block>, section: &Section) {
    if let Some(heading) = &section.heading {
        blocks.push(Block::Paragraph(
            Paragraph::new(normalize_fullwidth(heading), StandardFont::HelveticaBold, HEADING_SIZE)
                .with_color(Color::DARK_GREY)
                .with_space_after(6.0),
        ));
    }
    for text in &section.paragraphs {
        blocks.push(Block::Paragraph(body(text).with_space_after(10.0)));
    }
    let count = section.bullets.len();
    for (i, text) in section.bullets.iter().enumerate() {
        let space_after = if i + 1 == count { 10.0 } else { 2.0 };
        blocks.push(Block::Paragraph(
            body(text)
                .with_marker("\u{2022}", BULLET_INDENT)
                .with_space_after(space_after),
        ));
    }
}

fn body(text: &str) -> Paragraph {
    Paragraph::new(normalize_fullwidth(text), StandardFont::Helvetica, BODY_SIZE)
        .with_line_height(BODY_LEADING)
}

/// Resolve every attachment source to bytes, in caption order.
///
/// A source that cannot be read yields an empty buffer, which the grid
/// turns into a placeholder at the same position.
pub fn load_attachments(report: &Report) -> Vec<Vec<u8>> {
    report
        .attachments
        .iter()
        .enumerate()
        .map(|(i, src)| {
            read_source_bytes(src).unwrap_or_else(|e| {
                log::warn!("Could not read attachment {}: {}", i + 1, e);
                Vec::new()
            })
        })
        .collect()
}

/// Build every block of the report: text sections, then the image grid
/// sized to the height the text leaves on the page.
pub fn build_report(report: &Report, attachments: Vec<Vec<u8>>) -> Vec<Block> {
    let width_pt = report.page.content_width();
    let mut blocks = build_text_blocks(report);

    // Pass one: measure the text without paginating it.
    let text_height_pt = measure_blocks(&blocks, width_pt);
    let remaining_in = (report.page.content_height() - text_height_pt) / PT_PER_IN;
    log::info!(
        "Text sections use {:.1}pt of {:.1}pt; {:.2}in left for {} image(s)",
        text_height_pt,
        report.page.content_height(),
        remaining_in,
        attachments.len()
    );

    let grid = ImageGrid::new(width_pt / PT_PER_IN, report.image_layout.clone());
    let budget = LayoutBudget::from_remaining(remaining_in, grid.config());
    let section = grid.build(attachments, &budget);
    blocks.extend(section.into_blocks());
    blocks
}

/// Render a report to PDF bytes.
pub fn render_report(report: &Report) -> Result<Vec<u8>, PagefitError> {
    if report.page.content_width() <= 0.0 || report.page.content_height() <= 0.0 {
        return Err(PagefitError::Render(format!(
            "Page margins leave no room for content ({:.1}pt x {:.1}pt)",
            report.page.content_width(),
            report.page.content_height()
        )));
    }

    let attachments = load_attachments(report);
    let blocks = build_report(report, attachments);

    // Pass two: paginate everything and serialize.
    let pages = LayoutEngine::new().layout(blocks, &report.page);
    let bytes = PdfWriter::new().write(&pages, &report.metadata);
    log::info!("Rendered {} page(s), {} bytes", pages.len(), bytes.len());
    Ok(bytes)
}

/// Parse a JSON report and render it to PDF bytes.
pub fn render_report_json(json: &str) -> Result<Vec<u8>, PagefitError> {
    let report: Report = serde_json::from_str(json)?;
    render_report(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageConfig;

    fn report(json: &str) -> Report {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_blocks_in_order() {
        let r = report(
            r#"{"title": "Visit", "subtitle": "Unit 4", "sections": [
                {"heading": "Notes", "paragraphs": ["p1"], "bullets": ["b1", "b2"]}
            ]}"#,
        );
        let blocks = build_text_blocks(&r);
        let texts: Vec<_> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::Paragraph(p) => Some(p.text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Visit", "Unit 4", "Notes", "p1", "b1", "b2"]);
    }

    #[test]
    fn test_fullwidth_text_normalized() {
        let r = report(r#"{"title": "１２３　Ｍａｉｎ"}"#);
        match &build_text_blocks(&r)[0] {
            Block::Paragraph(p) => assert_eq!(p.text, "123 Main"),
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_no_attachments_no_image_header() {
        let r = report(r#"{"title": "T"}"#);
        let blocks = build_report(&r, vec![]);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_unreadable_attachment_keeps_slot() {
        let r = report(r#"{"title": "T", "attachments": ["./does/not/exist.png"]}"#);
        let loaded = load_attachments(&r);
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].is_empty());
    }

    #[test]
    fn test_zero_content_area_is_error() {
        let mut r = report(r#"{"title": "T"}"#);
        r.page = PageConfig {
            margin: crate::model::Edges::uniform(400.0),
            ..PageConfig::default()
        };
        assert!(matches!(render_report(&r), Err(PagefitError::Render(_))));
    }

    #[test]
    fn test_bad_json_has_hint() {
        let err = render_report_json(r#"{"title": "T",}"#).unwrap_err();
        assert!(matches!(err, PagefitError::Parse { .. }));
        assert!(err.to_string().contains("Hint"));
    }
}
