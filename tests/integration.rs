//! Integration tests for the pagefit rendering pipeline.
//!
//! These tests exercise the full path from JSON input to PDF output.
//! They verify:
//! - Reports with and without attachments produce structurally valid PDFs
//! - The image budget follows the text that precedes it
//! - Screenshots and photos land in the right kind of row
//! - Broken attachments become placeholders without aborting the render

use base64::Engine;
use image::{ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use pagefit::images::grid::{GridCell, RowKind};
use pagefit::images::measure::PT_PER_IN;
use pagefit::layout::{measure_blocks, Block, DrawCommand, LayoutEngine};
use pagefit::report::build_text_blocks;
use pagefit::model::Report;
use pagefit::{build_report, render_report, render_report_json, ImageGrid, ImageLayoutConfig, LayoutBudget};

// ─── Helpers ────────────────────────────────────────────────────

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 120, 40]));
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ColorType::Rgb8)
        .unwrap();
    buf
}

fn png_with_alpha(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 255, 100]));
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ColorType::Rgba8)
        .unwrap();
    buf
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([90, 90, 90]));
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, 80)
        .write_image(img.as_raw(), width, height, image::ColorType::Rgb8)
        .unwrap();
    buf
}

fn data_uri(bytes: &[u8], mime: &str) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn report_json(attachments: &[String], paragraphs: usize) -> String {
    let paragraphs: Vec<String> = (0..paragraphs)
        .map(|i| format!("\"Paragraph {} describing the visit in enough words to wrap onto a second line of the page.\"", i))
        .collect();
    let attachments: Vec<String> = attachments.iter().map(|a| format!("\"{}\"", a)).collect();
    format!(
        r#"{{
            "metadata": {{ "title": "Integration" }},
            "title": "Service Visit",
            "sections": [{{ "heading": "Notes", "paragraphs": [{}] }}],
            "attachments": [{}]
        }}"#,
        paragraphs.join(","),
        attachments.join(",")
    )
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

fn grid_rows(blocks: &[Block]) -> Vec<&pagefit::images::grid::Row> {
    blocks
        .iter()
        .filter_map(|b| match b {
            Block::ImageRow(r) => Some(&r.row),
            _ => None,
        })
        .collect()
}

// ─── Full pipeline ──────────────────────────────────────────────

#[test]
fn text_only_report_renders() {
    let bytes = render_report_json(&report_json(&[], 2)).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7"));
    assert!(bytes.ends_with(b"%%EOF\n"));
    assert_eq!(count(&bytes, b"/Type /Page "), 1);
    assert_eq!(count(&bytes, b"/Subtype /Image"), 0);
}

#[test]
fn mixed_attachments_render_as_xobjects() {
    let attachments = vec![
        data_uri(&png(40, 30), "image/png"),
        data_uri(&jpeg(64, 48), "image/jpeg"),
        data_uri(&png_with_alpha(90, 195), "image/png"),
    ];
    let bytes = render_report_json(&report_json(&attachments, 1)).unwrap();
    assert_eq!(count(&bytes, b"/Filter /DCTDecode"), 1);
    assert_eq!(count(&bytes, b"/SMask"), 1);
    // two RGB images plus one SMask
    assert_eq!(count(&bytes, b"/Subtype /Image"), 4);
}

#[test]
fn corrupt_attachment_keeps_others() {
    let attachments = vec![
        data_uri(&png(40, 30), "image/png"),
        data_uri(b"definitely not an image", "image/png"),
        data_uri(&png(40, 30), "image/png"),
    ];
    let report: Report = serde_json::from_str(&report_json(&attachments, 1)).unwrap();
    let blocks = build_report(&report, pagefit::report::load_attachments(&report));
    let rows = grid_rows(&blocks);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].indices(), vec![1, 2]);
    assert!(matches!(&rows[0].cells[1], GridCell::Placeholder(f) if f.index == 2));
    assert_eq!(rows[1].indices(), vec![3]);

    let bytes = render_report(&report).unwrap();
    assert_eq!(count(&bytes, b"/Subtype /Image"), 2);
}

#[test]
fn screenshot_gets_its_own_row() {
    let attachments = vec![
        data_uri(&png(40, 30), "image/png"),
        data_uri(&png(90, 195), "image/png"),
        data_uri(&png(40, 30), "image/png"),
    ];
    let report: Report = serde_json::from_str(&report_json(&attachments, 0)).unwrap();
    let blocks = build_report(&report, pagefit::report::load_attachments(&report));
    let kinds: Vec<_> = grid_rows(&blocks).iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![RowKind::Packed, RowKind::Spanning, RowKind::Packed]);
}

#[test]
fn more_text_means_smaller_images() {
    let attachments: Vec<String> = (0..6).map(|_| data_uri(&png(40, 30), "image/png")).collect();
    let tallest = |paragraphs: usize| {
        let report: Report = serde_json::from_str(&report_json(&attachments, paragraphs)).unwrap();
        let blocks = build_report(&report, pagefit::report::load_attachments(&report));
        grid_rows(&blocks)
            .iter()
            .map(|r| r.image_height_pt())
            .fold(0.0, f64::max)
    };
    let short = tallest(1);
    let long = tallest(12);
    assert!(long < short, "{} should be below {}", long, short);
    assert!(long + 1e-9 >= 0.8 * PT_PER_IN);
}

#[test]
fn image_rows_never_split_across_pages() {
    let attachments: Vec<String> = (0..10).map(|_| data_uri(&png(30, 40), "image/png")).collect();
    let report: Report = serde_json::from_str(&report_json(&attachments, 20)).unwrap();
    let blocks = build_report(&report, pagefit::report::load_attachments(&report));
    let pages = LayoutEngine::new().layout(blocks, &report.page);

    assert!(pages.len() > 1);
    let bottom = report.page.size.dimensions().1 - report.page.margin.bottom;
    let mut images = 0;
    for page in &pages {
        for element in &page.elements {
            if let DrawCommand::Image { .. } = element.draw {
                images += 1;
                assert!(element.y + element.height <= bottom + 1e-6);
            }
        }
    }
    assert_eq!(images, 10);
}

#[test]
fn scaled_grid_stays_on_one_page() {
    let attachments: Vec<String> = (0..8)
        .map(|_| format!("\"{}\"", data_uri(&png(40, 30), "image/png")))
        .collect();
    let json = format!(
        r#"{{ "title": "Gallery", "attachments": [{}] }}"#,
        attachments.join(",")
    );
    let report: Report = serde_json::from_str(&json).unwrap();

    let grid = ImageGrid::new(
        report.page.content_width() / PT_PER_IN,
        report.image_layout.clone(),
    );
    let text_pt = measure_blocks(&build_text_blocks(&report), report.page.content_width());
    let budget = LayoutBudget::from_remaining(
        (report.page.content_height() - text_pt) / PT_PER_IN,
        grid.config(),
    );
    let section = grid.build(pagefit::report::load_attachments(&report), &budget);
    assert!(section.scale < 1.0);
    assert!(!section.overflows_budget());
    for row in &section.rows {
        assert!(row.image_height_pt() > 0.8 * PT_PER_IN);
    }

    let blocks = build_report(&report, pagefit::report::load_attachments(&report));
    assert_eq!(grid_rows(&blocks).len(), 4);
    let pages = LayoutEngine::new().layout(blocks, &report.page);
    assert_eq!(pages.len(), 1);
}

#[test]
fn fitting_grid_is_not_scaled() {
    let grid = ImageGrid::new(7.0, ImageLayoutConfig::default());
    let budget = LayoutBudget::from_remaining(10.0, grid.config());
    let section = grid.build(vec![png(40, 30), png(40, 30), png(40, 30)], &budget);
    assert_eq!(section.scale, 1.0);
    assert!(!section.overflows_budget());
    assert!(section.projected_height_in() <= section.budget_in);
}

#[test]
fn invalid_json_reports_hint() {
    let err = render_report_json("{\"title\": ").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Failed to parse report"));
    assert!(message.contains("Hint"));
}

#[test]
fn missing_title_is_a_schema_error() {
    let err = render_report_json("{\"sections\": []}").unwrap_err();
    assert!(err.to_string().contains("schema"));
}
