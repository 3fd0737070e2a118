//! # Screenshot Classification
//!
//! Decides whether an attachment is a screen capture or a camera photograph
//! using only pixel dimensions and camera-metadata presence. Screen captures
//! cluster tightly around known device resolutions and aspect ratios; camera
//! photos are high resolution, carry camera metadata, or have generic 4:3 and
//! 3:2 ratios.
//!
//! The reference tables are plain data so the thresholds can be audited and
//! tested on their own.

use crate::image_loader::decode_image_bytes;

use super::item::{ClassifiedImage, FailedImage, ImageEntry, ImageKind};

/// Above this pixel count an image is treated as a camera photo.
pub const CAMERA_PIXEL_THRESHOLD: u64 = 12_000_000;

/// Portrait images below this pixel count get the relaxed ratio check.
pub const SMALL_PORTRAIT_PIXEL_LIMIT: u64 = 4_000_000;

/// Portrait screen ratios as short side / long side.
///
/// 3/4 and 2/3 are absent on purpose: they match camera sensors (4:3, 3:2).
pub const SCREEN_RATIOS: [f64; 5] = [
    9.0 / 16.0,   // 0.5625 classic smartphone, 16:9 desktop
    9.0 / 19.5,   // 0.4615 iPhone X through 15
    9.0 / 20.0,   // 0.4500 tall Android
    9.0 / 21.0,   // 0.4286 very tall Android
    10.0 / 16.0,  // 0.6250 16:10 tablet and some Android
];

/// Known device screen widths/heights in pixels (phones, tablets, desktops).
pub const SCREEN_DIMENSIONS: [u32; 46] = [
    // iPhone, points and pixels
    375, 390, 393, 414, 428, 430, 750, 828, 858, 886, 1080, 1125, 1170, 1179, 1242, 1284, 1290,
    1320,
    // iPad
    768, 810, 820, 834, 1024, 1112, 1133, 1194, 1366, 1640, 1668, 2048, 2224, 2388, 2732,
    // desktop
    1280, 1440, 1536, 1600, 1680, 1920, 2560, 2880, 3456,
    // Android
    360, 412, 720, 2160,
];

/// Landscape images must match 9:16 this closely to count as desktop captures.
pub const LANDSCAPE_RATIO_TOLERANCE: f64 = 0.02;
/// Ratio tolerance when one side matches a known device dimension.
pub const DEVICE_RATIO_TOLERANCE: f64 = 0.08;
/// Ratio tolerance with no other evidence.
pub const STRICT_RATIO_TOLERANCE: f64 = 0.015;
/// Ratio tolerance for small portrait images without camera metadata.
pub const SMALL_PORTRAIT_RATIO_TOLERANCE: f64 = 0.12;
/// Small portrait images narrower than this are not phone captures.
pub const SMALL_PORTRAIT_MIN_RATIO: f64 = 0.35;

/// Smallest distance between `ratio` and any reference screen ratio.
pub fn min_ratio_delta(ratio: f64) -> f64 {
    SCREEN_RATIOS
        .iter()
        .map(|r| (ratio - r).abs())
        .fold(f64::INFINITY, f64::min)
}

fn is_device_dimension(px: u32) -> bool {
    SCREEN_DIMENSIONS.contains(&px)
}

/// Heuristic screen-capture test. The first matching rule decides; when no
/// screenshot rule fires the image is a photograph.
pub fn is_screenshot(width_px: u32, height_px: u32, has_camera_exif: bool) -> bool {
    if width_px == 0 || height_px == 0 {
        return false;
    }

    let pixels = width_px as u64 * height_px as u64;
    if pixels > CAMERA_PIXEL_THRESHOLD {
        return false;
    }

    if has_camera_exif {
        return false;
    }

    let short = width_px.min(height_px) as f64;
    let long = width_px.max(height_px) as f64;
    let ratio = short / long;

    // Phones capture in portrait. Landscape only passes as a 16:9 desktop.
    let is_landscape = width_px > height_px;
    if is_landscape && (ratio - 9.0 / 16.0).abs() > LANDSCAPE_RATIO_TOLERANCE {
        return false;
    }

    let min_delta = min_ratio_delta(ratio);

    if (is_device_dimension(width_px) || is_device_dimension(height_px))
        && min_delta < DEVICE_RATIO_TOLERANCE
    {
        return true;
    }
    if min_delta < STRICT_RATIO_TOLERANCE {
        return true;
    }
    !is_landscape
        && pixels < SMALL_PORTRAIT_PIXEL_LIMIT
        && ratio > SMALL_PORTRAIT_MIN_RATIO
        && min_delta < SMALL_PORTRAIT_RATIO_TOLERANCE
}

/// Decode one attachment and classify it.
///
/// `index` is the 1-based caption index. Decode failures, including zero
/// width or height, come back as [`ImageEntry::Failed`] carrying that index.
pub fn classify(index: usize, bytes: Vec<u8>) -> ImageEntry<ClassifiedImage> {
    match decode_image_bytes(bytes) {
        Ok(image) => {
            let kind = if is_screenshot(image.width_px, image.height_px, image.has_camera_exif) {
                ImageKind::Screenshot
            } else {
                ImageKind::Photograph
            };
            log::debug!(
                "Image {}: {}x{} px, camera exif: {}, classified as {:?}",
                index,
                image.width_px,
                image.height_px,
                image.has_camera_exif,
                kind
            );
            ImageEntry::Ready(ClassifiedImage { index, image, kind })
        }
        Err(e) => {
            log::warn!("Error loading image {}: {}", index, e);
            ImageEntry::Failed(FailedImage {
                index,
                reason: e.to_string(),
            })
        }
    }
}
