//! The guide2pdf library converts structured guide records into paginated,
//! styled documents. It provides the complete layout pipeline: inline-markup
//! tokenization, block splitting, text flow with line-continuation semantics,
//! per-language code highlighting, overflow-predicting pagination, and a
//! record-driven document assembler.
//!
//! The library never touches fonts, image bytes or an output file itself.
//! Every drawing decision is expressed against the [`canvas::Canvas`]
//! capability trait, so any backend (a PDF writer, a preview surface, the
//! built-in trace canvas) can carry the same layout. Visual properties are
//! configurable via a TOML style sheet.
//!
//! Basic usage builds a record list and renders it over a canvas:
//! ```rust
//! use guide2pdf::{generate_document, ContentRecord, GuideDocument, Locale, StyleSheet};
//! use guide2pdf::canvas::LayoutCanvas;
//!
//! let style = StyleSheet::default();
//! let mut canvas = LayoutCanvas::a4(style.margins);
//! let doc = GuideDocument {
//!     name: "demo".to_string(),
//!     release_date: "05/03/2024".to_string(),
//!     records: vec![
//!         ContentRecord::text("Install", "<p>Run the <strong>installer</strong>.</p>", true),
//!         ContentRecord::code("main.js", "javascript", "const x = 'hi';", 10.0),
//!     ],
//! };
//! generate_document(&doc, Locale::English, &style, &mut canvas).unwrap();
//! assert!(canvas.page_count() >= 1);
//! ```
//!
//! Styling overrides come from a TOML source:
//! ```rust
//! use guide2pdf::config::{load_style_from_source, ConfigSource};
//!
//! let style = load_style_from_source(ConfigSource::Embedded(
//!     r#"
//!     [item]
//!     text_size = 13
//!     "#,
//! ));
//! assert_eq!(style.item.text_size, 13.0);
//! ```

use std::error::Error;
use std::fmt;

pub mod assembler;
pub mod canvas;
pub mod config;
pub mod highlighting;
pub mod layout;
pub mod markup;
pub mod styling;

pub use assembler::{
    format_date, ContentRecord, DocumentAssembler, GuideDocument, Locale, RecordKind,
};
pub use canvas::Canvas;
pub use styling::StyleSheet;

/// Errors surfaced to callers of the document pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum GdpError {
    /// A release date that does not parse as `DD/MM/YYYY`.
    DateError { value: String, suggestion: String },
    /// The canvas backend failed to flush or write the document.
    CanvasError { message: String, suggestion: String },
}

impl Error for GdpError {}
impl fmt::Display for GdpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GdpError::DateError { value, suggestion } => {
                write!(f, "❌ Invalid Release Date: {:?}", value)?;
                write!(f, "\n💡 Suggestion: {}", suggestion)
            }
            GdpError::CanvasError {
                message,
                suggestion,
            } => {
                write!(f, "❌ Document Output Error: {}", message)?;
                write!(f, "\n💡 Suggestion: {}", suggestion)
            }
        }
    }
}

/// Renders a whole document over the given canvas: every record in order,
/// then a final flush via [`Canvas::finish`].
pub fn generate_document(
    doc: &GuideDocument,
    locale: Locale,
    style: &StyleSheet,
    canvas: &mut dyn Canvas,
) -> Result<(), GdpError> {
    DocumentAssembler::new(canvas, style, locale).generate(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{LayoutCanvas, Margins};

    #[test]
    fn test_generate_document_minimal() {
        let style = StyleSheet::default();
        let mut canvas = LayoutCanvas::a4(style.margins);
        let doc = GuideDocument {
            name: "demo".to_string(),
            release_date: "01/01/2024".to_string(),
            records: vec![ContentRecord::text("Title", "<p>hello</p>", false)],
        };
        assert!(generate_document(&doc, Locale::English, &style, &mut canvas).is_ok());
        assert!(canvas.is_finished());
    }

    #[test]
    fn test_generate_document_surfaces_bad_date() {
        let style = StyleSheet::default();
        let mut canvas = LayoutCanvas::a4(style.margins);
        let doc = GuideDocument {
            name: "demo".to_string(),
            release_date: "bogus".to_string(),
            records: vec![ContentRecord::intro("Guide", "welcome")],
        };
        match generate_document(&doc, Locale::English, &style, &mut canvas) {
            Err(GdpError::DateError { value, .. }) => assert_eq!(value, "bogus"),
            other => panic!("expected date error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_display_carries_suggestion() {
        let err = GdpError::CanvasError {
            message: "disk full".to_string(),
            suggestion: "free some space".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("disk full"));
        assert!(text.contains("Suggestion"));
    }

    #[test]
    fn test_margins_flow_into_canvas() {
        let style = StyleSheet::default();
        let canvas = LayoutCanvas::a4(style.margins);
        assert_eq!(canvas.margins(), Margins::trbl(40.0, 30.0, 40.0, 30.0));
    }
}
