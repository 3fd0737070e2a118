//! # PDF Serializer
//!
//! Takes the laid-out pages from the layout engine and writes a valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. Reports need a small subset of the
//! format: two standard fonts, images, lines, and text, so the bytes are
//! written directly.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog
//! 2 0 obj ... endobj  <- page tree
//! 3 0 obj ... endobj  <- fonts, then per page: images, content, page
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```

use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::font::StandardFont;
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::layout::{Color, DrawCommand, LayoutElement, LayoutPage};
use crate::model::Metadata;

/// Producer string written to the Info dictionary.
const PRODUCER: &str = concat!("pagefit ", env!("CARGO_PKG_VERSION"));

pub struct PdfWriter;

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Object ids of the fonts, in `StandardFont::ALL` order.
    font_objects: Vec<usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn new() -> Self {
        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        Self {
            objects: (0..3).map(|_| PdfObject { data: vec![] }).collect(),
            font_objects: Vec::new(),
        }
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(&self, pages: &[LayoutPage], metadata: &Metadata) -> Vec<u8> {
        let mut builder = PdfBuilder::new();

        for font in StandardFont::ALL {
            let dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.pdf_name()
            );
            let id = builder.push(dict.into_bytes());
            builder.font_objects.push(id);
        }

        let mut page_obj_ids: Vec<usize> = Vec::new();
        for page in pages {
            // Images are written once per occurrence; each cell owns its pixels.
            let mut image_ids = Vec::new();
            for element in &page.elements {
                if let DrawCommand::Image { image } = &element.draw {
                    image_ids.push(Self::write_image_xobject(&mut builder, image));
                }
            }

            let content = self.build_content_stream(page);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            let content_obj_id = builder.push(content_data);

            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << {} >>{} >> >>",
                page.width,
                page.height,
                content_obj_id,
                self.build_font_resource_dict(&builder.font_objects),
                Self::build_xobject_resource_dict(&image_ids),
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = builder.push(Self::build_info_dict(metadata).into_bytes());

        log::debug!(
            "Serialized {} page(s) into {} objects",
            pages.len(),
            builder.objects.len() - 1
        );
        self.serialize(&builder, info_obj_id)
    }

    fn build_info_dict(metadata: &Metadata) -> String {
        let mut info = String::from("<< ");
        if let Some(ref title) = metadata.title {
            let _ = write!(info, "/Title ({}) ", Self::encode_text(title));
        }
        if let Some(ref author) = metadata.author {
            let _ = write!(info, "/Author ({}) ", Self::encode_text(author));
        }
        if let Some(ref subject) = metadata.subject {
            let _ = write!(info, "/Subject ({}) ", Self::encode_text(subject));
        }
        let creator = metadata.creator.as_deref().unwrap_or("pagefit");
        let _ = write!(
            info,
            "/Creator ({}) /Producer ({}) >>",
            Self::encode_text(creator),
            PRODUCER
        );
        info
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream(&self, page: &LayoutPage) -> String {
        let mut stream = String::new();
        let mut image_counter = 0;
        for element in &page.elements {
            self.write_element(&mut stream, element, page.height, &mut image_counter);
        }
        stream
    }

    /// Write a single layout element as PDF operators.
    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        image_counter: &mut usize,
    ) {
        match &element.draw {
            DrawCommand::Text {
                lines,
                font,
                font_size,
                color,
            } => {
                Self::set_fill(stream, color);
                let _ = writeln!(stream, "BT");
                for line in lines {
                    let _ = write!(
                        stream,
                        "/{} {:.1} Tf\n1 0 0 1 {:.2} {:.2} Tm\n({}) Tj\n",
                        font.resource_name(),
                        font_size,
                        line.x,
                        page_height - line.y,
                        Self::encode_text(&line.text)
                    );
                }
                let _ = writeln!(stream, "ET");
            }

            DrawCommand::Rule { thickness, color } => {
                let y = page_height - element.y - thickness / 2.0;
                let _ = write!(
                    stream,
                    "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                    color.r,
                    color.g,
                    color.b,
                    thickness,
                    element.x,
                    y,
                    element.x + element.width,
                    y
                );
            }

            DrawCommand::Image { .. } => {
                let x = element.x;
                let y = page_height - element.y - element.height;
                let _ = write!(
                    stream,
                    "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                    element.width, element.height, x, y, image_counter
                );
                *image_counter += 1;
            }

            DrawCommand::Placeholder { text, font_size } => {
                let font = StandardFont::Helvetica;
                let width = font.measure_string(text, *font_size);
                let x = element.x + (element.width - width).max(0.0) / 2.0;
                let baseline = element.y + (element.height + font_size * 0.718) / 2.0;
                Self::set_fill(stream, &Color::ERROR_RED);
                let _ = write!(
                    stream,
                    "q\nBT\n/{} {:.1} Tf\n1 0 0 1 {:.2} {:.2} Tm\n({}) Tj\nET\nQ\n",
                    font.resource_name(),
                    font_size,
                    x,
                    page_height - baseline,
                    Self::encode_text(text)
                );
            }
        }
    }

    fn set_fill(stream: &mut String, color: &Color) {
        let _ = writeln!(stream, "{:.3} {:.3} {:.3} rg", color.r, color.g, color.b);
    }

    /// Write an image as an XObject, returning its object id.
    ///
    /// JPEG bytes pass straight through with DCTDecode. Decoded pixels are
    /// Flate-compressed, with alpha carried in a separate SMask image.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space_str = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode \
                     /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    color_space_str,
                    data.len()
                );
                obj_data.extend_from_slice(data);
                obj_data.extend_from_slice(b"\nendstream");
                builder.push(obj_data)
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_id = alpha.as_ref().map(|alpha_data| {
                    let compressed = compress_to_vec_zlib(alpha_data, 6);
                    let mut smask_data: Vec<u8> = Vec::new();
                    let _ = write!(
                        smask_data,
                        "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode \
                         /Length {} >>\nstream\n",
                        image.width_px,
                        image.height_px,
                        compressed.len()
                    );
                    smask_data.extend_from_slice(&compressed);
                    smask_data.extend_from_slice(b"\nendstream");
                    builder.push(smask_data)
                });

                let compressed = compress_to_vec_zlib(rgb, 6);
                let smask_ref = smask_id
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();
                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode \
                     /Length {}{} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    compressed.len(),
                    smask_ref
                );
                obj_data.extend_from_slice(&compressed);
                obj_data.extend_from_slice(b"\nendstream");
                builder.push(obj_data)
            }
        }
    }

    fn build_font_resource_dict(&self, font_objects: &[usize]) -> String {
        StandardFont::ALL
            .iter()
            .zip(font_objects)
            .map(|(font, obj_id)| format!("/{} {} 0 R", font.resource_name(), obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_xobject_resource_dict(image_ids: &[usize]) -> String {
        if image_ids.is_empty() {
            return String::new();
        }
        let entries = image_ids
            .iter()
            .enumerate()
            .map(|(idx, obj_id)| format!("/Im{} {} 0 R", idx, obj_id))
            .collect::<Vec<_>>()
            .join(" ");
        format!(" /XObject << {} >>", entries)
    }

    /// Encode text as the body of a PDF literal string in WinAnsiEncoding.
    ///
    /// Delimiters are escaped, bytes outside printable ASCII are written as
    /// octal escapes, and unmappable characters become `?`.
    fn encode_text(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for ch in s.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    ///
    /// WinAnsiEncoding is based on Windows-1252. Most codepoints in
    /// 0x20..=0x7E and 0xA0..=0xFF map directly; 0x80..=0x9F holds smart
    /// quotes, bullets, and dashes.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // euro
            0x2026 => Some(0x85), // ellipsis
            0x2018 => Some(0x91),
            0x2019 => Some(0x92),
            0x201C => Some(0x93),
            0x201D => Some(0x94),
            0x2022 => Some(0x95), // bullet
            0x2013 => Some(0x96), // en dash
            0x2014 => Some(0x97), // em dash
            0x2122 => Some(0x99), // trade mark
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );
        output
    }
}
