//! # pagefit
//!
//! Renders short PDF reports that end with an unpredictable pile of
//! attachments: phone screenshots, desktop captures, camera photos, the
//! occasional corrupt upload.
//!
//! Images are sized for the space the report has *left*. The text is
//! measured first, then a single scale factor shrinks the whole image grid
//! to fit what remains, while screenshots keep a full-width row and nothing
//! drops below a legible height.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON)
//!       ↓
//!   [model]    — Report: title, sections, attachment sources
//!       ↓
//!   [report]   — Two passes: measure text, then size images to the rest
//!       ↓            ↘
//!       ↓          [images]  — classify → measure → scale → apply → grid
//!       ↓            ↙
//!   [layout]   — Flow blocks onto pages, rows never split
//!       ↓
//!   [pdf]      — Serialize to PDF bytes
//! ```

pub mod error;
pub mod font;
pub mod image_loader;
pub mod images;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod report;
pub mod text;

pub use error::PagefitError;
pub use images::{ImageGrid, ImageLayoutConfig, ImageSection, LayoutBudget};
pub use model::Report;
pub use report::{build_report, render_report, render_report_json};
