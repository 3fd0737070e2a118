//! Structured error types for the pagefit pipeline.
//!
//! Per-image failures never reach this type: the image engine turns them
//! into placeholder cells. What remains is report parsing, source loading,
//! I/O from the CLI, and serialization.

use thiserror::Error;

/// The unified error type returned by all public pagefit API functions.
#[derive(Debug, Error)]
pub enum PagefitError {
    /// JSON input failed to parse as a valid report.
    #[error("Failed to parse report: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// An image could not be read or decoded.
    #[error("Image error: {0}")]
    Image(String),
    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Layout or PDF generation failed.
    #[error("Render error: {0}")]
    Render(String),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for PagefitError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the report schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        PagefitError::Parse { source: e, hint }
    }
}
