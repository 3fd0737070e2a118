//! # Report Model
//!
//! The input representation for a report: a title, some text sections, and
//! a list of image attachments. Designed to be produced directly as JSON by
//! whatever system owns the data.

use serde::{Deserialize, Serialize};

use crate::images::ImageLayoutConfig;

/// A complete report ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Document metadata (title, author, etc.)
    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub page: PageConfig,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    /// Text sections, rendered in order before the images.
    #[serde(default)]
    pub sections: Vec<Section>,

    /// Image sources: data URIs, file paths, or raw base64. Caption numbers
    /// follow this order.
    #[serde(default)]
    pub attachments: Vec<String>,

    /// Overrides for the image grid.
    #[serde(default)]
    pub image_layout: ImageLayoutConfig,
}

/// One block of text under an optional heading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
}

/// Document metadata embedded in the PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

/// Configuration for a page: size and margins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page size. Defaults to Letter.
    #[serde(default)]
    pub size: PageSize,

    /// Page margins in points (1/72 inch).
    #[serde(default = "default_margin")]
    pub margin: Edges,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::Letter,
            margin: default_margin(),
        }
    }
}

/// Half an inch top and bottom, three quarters left and right.
fn default_margin() -> Edges {
    Edges::symmetric(36.0, 54.0)
}

impl PageConfig {
    /// Width available for content, in points.
    pub fn content_width(&self) -> f64 {
        (self.size.dimensions().0 - self.margin.horizontal()).max(0.0)
    }

    /// Height available for content on one page, in points.
    pub fn content_height(&self) -> f64 {
        (self.size.dimensions().1 - self.margin.vertical()).max(0.0)
    }
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    A4,
    #[default]
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left) used for margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}
