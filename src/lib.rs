//! # Platen
//!
//! A template layout and data-binding engine for fixed-page documents.
//!
//! Templates are designed on a canvas: absolutely positioned text, rules,
//! tables and images on a fixed-size page. That works until real data
//! arrives. A table that held three sample rows at design time now holds
//! forty, and drawn at its authored box it either gets clipped or paints
//! over the totals below it.
//!
//! Platen keeps the author's design and lets the data push it around: the
//! page is read as a stack of rows, every element is measured with its data
//! bound, and each row is placed below the tallest thing above it. The same
//! repositioned tree then feeds both the HTML preview and the PDF, so what
//! the author previews is what gets printed.
//!
//! ## Architecture
//!
//! ```text
//! Template JSON + data JSON
//!       ↓
//!   [model]    — Page + positioned elements
//!       ↓
//!   [binding]  — Resolve {{paths}} against the data
//!       ↓
//!   [layout]   — Measure, group into rows, restack
//!       ↓
//!   [render]   — Target-agnostic visual tree
//!       ↓              ↓
//!   [html]         [pdf]   — Markup preview / PDF bytes
//! ```

pub mod binding;
pub mod error;
pub mod font;
pub mod html;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod render;
pub mod sample;
pub mod service;
pub mod store;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::PlatenError;

use serde_json::Value;

use html::HtmlOptions;
use layout::LayoutConfig;
use model::Template;
use pdf::{Metadata, PdfWriter};
use render::{render_template, VisualTree};

/// Reposition and bind a template with the default layout constants.
pub fn layout(template: &Template, data: &Value) -> VisualTree {
    render_template(template, data, &LayoutConfig::default())
}

/// Render a template to PDF bytes.
///
/// This is the primary entry point. The document title is taken from the
/// template name. Images load from inline data only; build a
/// [`PdfWriter`] with [`PdfWriter::with_file_access`] to read files.
pub fn render_pdf(template: &Template, data: &Value) -> Result<Vec<u8>, PlatenError> {
    let tree = layout(template, data);
    PdfWriter::new().write(&tree, &Metadata::for_template(template))
}

/// Render a template to a standalone HTML document.
pub fn render_html(template: &Template, data: &Value) -> String {
    html::to_html(&layout(template, data), &HtmlOptions::default())
}

/// Render a template and data, both given as JSON, to PDF bytes.
pub fn render_json(template_json: &str, data_json: &str) -> Result<Vec<u8>, PlatenError> {
    let template = Template::from_json(template_json)?;
    let data: Value = serde_json::from_str(data_json)?;
    render_pdf(&template, &data)
}
