//! # Text Layout
//!
//! Greedy line breaking over UAX#14 break opportunities, measured with the
//! standard font metrics. Good enough for report prose; there is no
//! hyphenation and no justification.

use crate::font::StandardFont;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    pub text: String,
    /// Width in points, trailing spaces excluded.
    pub width: f64,
}

/// Replace full-width ASCII variants (U+FF01..U+FF5E) and the ideographic
/// space with their ASCII forms.
///
/// Addresses typed through an IME often arrive as `１２３　Ｍａｉｎ`, which
/// WinAnsi fonts cannot show.
pub fn normalize_fullwidth(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\u{FF01}'..='\u{FF5E}' => {
                char::from_u32(ch as u32 - 0xFF01 + 0x21).unwrap_or(ch)
            }
            '\u{3000}' => ' ',
            _ => ch,
        })
        .collect()
}

/// Break `text` into lines no wider than `max_width` points.
///
/// Lines break at UAX#14 opportunities; a word wider than the line is split
/// at the character that overflows. Newlines are mandatory breaks. Empty
/// input gives a single empty line.
pub fn break_into_lines(
    text: &str,
    font: StandardFont,
    font_size: f64,
    max_width: f64,
) -> Vec<BrokenLine> {
    let mut lines = Vec::new();
    let mut segment_start = 0;

    for (offset, opportunity) in linebreaks(text) {
        if opportunity != BreakOpportunity::Mandatory {
            continue;
        }
        let segment = text[segment_start..offset].trim_end_matches(['\n', '\r', '\u{2028}', '\u{2029}']);
        wrap_segment(segment, font, font_size, max_width, &mut lines);
        segment_start = offset;
    }
    if segment_start < text.len() || lines.is_empty() {
        wrap_segment(&text[segment_start..], font, font_size, max_width, &mut lines);
    }
    lines
}

/// Wrap text that contains no mandatory breaks.
fn wrap_segment(
    segment: &str,
    font: StandardFont,
    font_size: f64,
    max_width: f64,
    lines: &mut Vec<BrokenLine>,
) {
    if segment.is_empty() {
        lines.push(make_line("", font, font_size));
        return;
    }

    // Words end at each allowed break, trailing whitespace included.
    let mut words = Vec::new();
    let mut start = 0;
    for (offset, _) in linebreaks(segment) {
        if offset > start {
            words.push(&segment[start..offset]);
        }
        start = offset;
    }

    let mut current = String::new();
    for word in words {
        let candidate_width =
            font.measure_string(current.trim_end(), font_size) + trailing_gap(&current, font, font_size)
                + font.measure_string(word.trim_end(), font_size);
        if current.is_empty() || candidate_width <= max_width {
            current.push_str(word);
        } else {
            lines.push(make_line(&current, font, font_size));
            current = word.to_string();
        }

        // Force-split words that cannot fit on a line of their own.
        while font.measure_string(current.trim_end(), font_size) > max_width {
            let split = overflow_split(&current, font, font_size, max_width);
            if split >= current.len() {
                break;
            }
            lines.push(make_line(&current[..split], font, font_size));
            current = current[split..].to_string();
        }
    }
    if !current.is_empty() {
        lines.push(make_line(&current, font, font_size));
    }
}

/// Width of the whitespace that separated `current` from the next word.
fn trailing_gap(current: &str, font: StandardFont, font_size: f64) -> f64 {
    let trimmed = current.trim_end();
    font.measure_string(&current[trimmed.len()..], font_size)
}

/// Byte offset of the first character that would overflow. Always at least
/// one character so the caller makes progress.
fn overflow_split(text: &str, font: StandardFont, font_size: f64, max_width: f64) -> usize {
    let mut width = 0.0;
    for (i, (byte, ch)) in text.char_indices().enumerate() {
        width += font.char_width(ch, font_size);
        if width > max_width && i > 0 {
            return byte;
        }
    }
    text.len()
}

fn make_line(text: &str, font: StandardFont, font_size: f64) -> BrokenLine {
    let text = text.trim_end();
    BrokenLine {
        text: text.to_string(),
        width: font.measure_string(text, font_size),
    }
}
