//! # Image Loading and Decoding
//!
//! Resolves attachment sources to bytes and decodes them once into the form
//! the rest of the pipeline needs: pixel dimensions and camera-metadata
//! presence for classification, and pixel data the PDF serializer can embed.
//!
//! JPEG images pass through without re-encoding (the PDF format supports
//! DCTDecode natively), so only their header is parsed. PNG and WebP images
//! are decoded to RGB with a separate alpha channel, and the encoded buffer
//! is dropped as soon as the pixels exist.

use std::io::Cursor;

use crate::error::PagefitError;

/// A fully decoded image ready for classification and PDF embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
    /// True when the file carries an EXIF camera sub-IFD (tag 0x8769).
    pub has_camera_exif: bool,
}

/// The pixel data in a format the PDF serializer can consume directly.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePixelData {
    /// Raw JPEG bytes, embedded directly with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Decoded RGB pixels + optional alpha channel.
    Decoded {
        /// width * height * 3 bytes (RGB)
        rgb: Vec<u8>,
        /// width * height bytes (grayscale alpha). None if fully opaque.
        alpha: Option<Vec<u8>>,
    },
}

/// JPEG color space for the PDF /ColorSpace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

/// Load and decode an image from a source string.
///
/// Supported `src` formats:
/// - `data:image/...;base64,...` data URI
/// - File path starting with `/`, `./` or `../`
/// - Raw base64-encoded image data
pub fn load_image(src: &str) -> Result<LoadedImage, PagefitError> {
    let raw_bytes = read_source_bytes(src)?;
    decode_image_bytes(raw_bytes)
}

/// Resolve the source string to raw image bytes.
pub fn read_source_bytes(src: &str) -> Result<Vec<u8>, PagefitError> {
    // Data URI: data:image/png;base64,iVBOR...
    if src.starts_with("data:image/") {
        let comma_pos = src
            .find(',')
            .ok_or_else(|| PagefitError::Image("Invalid data URI: missing comma".to_string()))?;
        return base64_decode(&src[comma_pos + 1..]);
    }

    // Only explicit path prefixes count as files; base64 text contains '/'.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        return std::fs::read(src).map_err(|e| {
            PagefitError::Image(format!("Failed to read image file '{}': {}", src, e))
        });
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, PagefitError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| PagefitError::Image(format!("Base64 decode error: {}", e)))
}

/// Detect image format from magic bytes and decode accordingly.
///
/// Takes ownership of the buffer so that decoded formats release the
/// encoded bytes before returning.
pub fn decode_image_bytes(data: Vec<u8>) -> Result<LoadedImage, PagefitError> {
    if data.len() < 4 {
        return Err(PagefitError::Image("Image data too short".to_string()));
    }

    let has_camera_exif = has_camera_exif(&data);

    let loaded = if is_jpeg(&data) {
        decode_jpeg(data, has_camera_exif)?
    } else if is_png(&data) || is_webp(&data) {
        decode_raster(&data, has_camera_exif)?
    } else {
        return Err(PagefitError::Image(
            "Unsupported image format (expected JPEG, PNG or WebP)".to_string(),
        ));
    };

    if loaded.width_px == 0 || loaded.height_px == 0 {
        return Err(PagefitError::Image(format!(
            "Degenerate image dimensions {}x{}",
            loaded.width_px, loaded.height_px
        )));
    }
    Ok(loaded)
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

/// Whether the container holds an EXIF block with camera (Exif IFD) fields.
///
/// Screen captures carry at most a TIFF-level block (orientation, software);
/// cameras write exposure data into the Exif sub-IFD.
fn has_camera_exif(data: &[u8]) -> bool {
    let mut cursor = Cursor::new(data);
    match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif.fields().any(|f| {
            f.tag == exif::Tag::ExifIFDPointer || matches!(f.tag.context(), exif::Context::Exif)
        }),
        Err(_) => false,
    }
}

/// JPEG: read dimensions and color space without decoding pixels.
fn decode_jpeg(data: Vec<u8>, has_camera_exif: bool) -> Result<LoadedImage, PagefitError> {
    let reader = image::io::Reader::new(Cursor::new(&data))
        .with_guessed_format()
        .map_err(|e| PagefitError::Image(format!("JPEG format detection error: {}", e)))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| PagefitError::Image(format!("Failed to read JPEG dimensions: {}", e)))?;

    let color_space = detect_jpeg_color_space(&data);

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg { data, color_space },
        width_px: width,
        height_px: height,
        has_camera_exif,
    })
}

/// Scan JPEG markers to find the SOF (Start of Frame) segment and read
/// the number of components to determine color space.
fn detect_jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2; // skip SOI marker (FF D8)
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        // SOF markers: C0-C3, C5-C7, C9-CB, CD-CF
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof && i + 9 < data.len() {
            // length(2) + precision(1) + height(2) + width(2) + num_components(1)
            return if data[i + 9] == 1 {
                JpegColorSpace::DeviceGray
            } else {
                JpegColorSpace::DeviceRGB
            };
        }
        if i + 3 < data.len() {
            let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            i += 2 + seg_len;
        } else {
            break;
        }
    }
    JpegColorSpace::DeviceRGB
}

/// PNG / WebP: decode to RGBA, split into RGB + alpha.
fn decode_raster(data: &[u8], has_camera_exif: bool) -> Result<LoadedImage, PagefitError> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| PagefitError::Image(format!("Format detection error: {}", e)))?;

    let img = reader
        .decode()
        .map_err(|e| PagefitError::Image(format!("Failed to decode image: {}", e)))?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();

    let pixel_count = (width as usize) * (height as usize);
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    let mut has_transparency = false;

    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel[3]);
        if pixel[3] != 255 {
            has_transparency = true;
        }
    }

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: if has_transparency { Some(alpha) } else { None },
        },
        width_px: width,
        height_px: height,
        has_camera_exif,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Which EXIF block to embed in a test JPEG.
    #[derive(Clone, Copy)]
    pub enum ExifBlock {
        /// IFD0 pointing at an Exif sub-IFD holding ExposureTime, as cameras write.
        Camera,
        /// IFD0 with only Orientation, as phones write into screen captures.
        OrientationOnly,
    }

    fn ifd_entry(out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
    }

    /// Little-endian TIFF structure for an APP1 segment.
    fn tiff(block: ExifBlock) -> Vec<u8> {
        let mut out = b"II".to_vec();
        out.extend_from_slice(&42u16.to_le_bytes());
        out.extend_from_slice(&8u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        match block {
            ExifBlock::Camera => {
                // IFD0 ends at 8 + 2 + 12 + 4 = 26
                ifd_entry(&mut out, 0x8769, 4, 1, 26);
                out.extend_from_slice(&0u32.to_le_bytes());
                out.extend_from_slice(&1u16.to_le_bytes());
                // ExposureTime, RATIONAL stored at 26 + 2 + 12 + 4 = 44
                ifd_entry(&mut out, 0x829A, 5, 1, 44);
                out.extend_from_slice(&0u32.to_le_bytes());
                out.extend_from_slice(&1u32.to_le_bytes());
                out.extend_from_slice(&100u32.to_le_bytes());
            }
            ExifBlock::OrientationOnly => {
                ifd_entry(&mut out, 0x0112, 3, 1, 1);
                out.extend_from_slice(&0u32.to_le_bytes());
            }
        }
        out
    }

    /// A baseline JPEG with an APP1 Exif segment right after SOI.
    pub fn jpeg_with_exif(width: u32, height: u32, block: ExifBlock) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([60, 60, 60]));
        let mut jpeg = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut jpeg);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            width,
            height,
            image::ColorType::Rgb8,
        )
        .unwrap();

        let mut payload = b"Exif\0\0".to_vec();
        payload.extend(tiff(block));
        let length = (payload.len() + 2) as u16;

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&length.to_be_bytes());
        out.extend(payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }
}
