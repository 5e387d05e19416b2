//! # Document Renderer
//!
//! Turns placed elements into a [`VisualTree`]: a flat, ordered list of
//! absolutely positioned boxes with fully resolved content. The tree is
//! target-agnostic. The HTML writer and the PDF writer both draw from it,
//! which is what keeps the preview and the final PDF identical.
//!
//! Nodes are emitted in template order, so later elements paint over
//! earlier ones exactly as they did on the design surface.

use serde::Serialize;
use serde_json::Value;

use crate::binding::{display_value, resolve_array, resolve_scalar};
use crate::layout::{LayoutConfig, LayoutEngine, PlacedElement};
use crate::model::*;

/// Shown in table cells with no value, and in every cell of an empty table.
pub const EMPTY_CELL: &str = "\u{2014}";

/// The rendered document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualTree {
    pub page: Page,
    pub nodes: Vec<VisualNode>,
}

/// One positioned box.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualNode {
    /// Id of the element this node was rendered from.
    pub id: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub content: NodeContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeContent {
    #[serde(rename_all = "camelCase")]
    Text {
        text: String,
        font_size: f64,
        bold: bool,
        align: HorizontalAlign,
    },
    /// A filled bar across the top of the box.
    Rule { thickness: f64 },
    #[serde(rename_all = "camelCase")]
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        /// The single row is a "no data" marker, not real data.
        placeholder: bool,
        header_height: f64,
        row_height: f64,
    },
    Image {
        src: String,
        fit: ImageFit,
    },
    ImagePlaceholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Start,
    Center,
    End,
}

impl From<TextAlign> for HorizontalAlign {
    fn from(align: TextAlign) -> Self {
        match align {
            TextAlign::Left => HorizontalAlign::Start,
            TextAlign::Center => HorizontalAlign::Center,
            TextAlign::Right => HorizontalAlign::End,
        }
    }
}

/// How an image fills its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    /// Scale to fit inside the box, keeping the aspect ratio.
    Contain,
    /// Stretch to the box.
    Fill,
}

/// Where content comes from for bound elements.
#[derive(Debug, Clone, Copy)]
enum Source<'d> {
    Data(&'d Value),
    /// Design-time rendering: bindings show authored content.
    Design,
}

/// Render placed elements with `data` bound.
pub fn render(placed: &[PlacedElement], page: &Page, data: &Value, config: &LayoutConfig) -> VisualTree {
    build_tree(placed, page, Source::Data(data), config)
}

/// Reposition and render a template against `data`.
pub fn render_template(template: &Template, data: &Value, config: &LayoutConfig) -> VisualTree {
    let engine = LayoutEngine::with_config(config.clone());
    let placed = engine.reposition(&template.elements, data);
    render(&placed, &template.page, data, config)
}

/// Render a template as designed, with no data: authored boxes and the
/// literal content of every element.
pub fn render_preview(template: &Template, config: &LayoutConfig) -> VisualTree {
    let engine = LayoutEngine::with_config(config.clone());
    let placed = engine.place_authored(&template.elements);
    build_tree(&placed, &template.page, Source::Design, config)
}

fn build_tree(placed: &[PlacedElement], page: &Page, source: Source, config: &LayoutConfig) -> VisualTree {
    let mut ordered: Vec<&PlacedElement> = placed.iter().collect();
    ordered.sort_by_key(|p| p.index);

    let nodes: Vec<VisualNode> = ordered
        .into_iter()
        .map(|p| VisualNode {
            id: p.element.id.clone(),
            left: p.element.x,
            top: p.y,
            width: p.element.width,
            height: p.height,
            content: render_content(&p.element.kind, source, config),
        })
        .collect();

    log::debug!("rendered {} nodes on a {}x{} page", nodes.len(), page.width, page.height);

    VisualTree {
        page: page.clone(),
        nodes,
    }
}

fn render_content(kind: &ElementKind, source: Source, config: &LayoutConfig) -> NodeContent {
    match kind {
        ElementKind::Text(text) => {
            let resolved = match (&text.binding, source) {
                (Some(path), Source::Data(data)) => resolve_scalar(path, data),
                _ => text.content.clone(),
            };
            NodeContent::Text {
                text: resolved,
                font_size: text.font_size,
                bold: text.font_weight == FontWeight::Bold,
                align: text.align.into(),
            }
        }
        ElementKind::Line(line) => NodeContent::Rule {
            thickness: line.thickness,
        },
        ElementKind::Table(table) => {
            let records: &[Value] = match source {
                Source::Data(data) => resolve_array(table.binding.as_deref(), data),
                Source::Design => &[],
            };
            let placeholder = records.is_empty();
            let rows = if placeholder {
                vec![vec![EMPTY_CELL.to_string(); table.columns.len()]]
            } else {
                records
                    .iter()
                    .map(|record| table.columns.iter().map(|col| cell_value(record, col)).collect())
                    .collect()
            };
            NodeContent::Table {
                columns: table.columns.clone(),
                rows,
                placeholder,
                header_height: config.table_header_height,
                row_height: config.table_row_height,
            }
        }
        ElementKind::Image(image) => {
            if image.src.is_empty() {
                NodeContent::ImagePlaceholder
            } else {
                NodeContent::Image {
                    src: image.src.clone(),
                    fit: if image.keeps_aspect_ratio() {
                        ImageFit::Contain
                    } else {
                        ImageFit::Fill
                    },
                }
            }
        }
    }
}

/// Look a column up in a record: lower-cased name first, then the exact
/// name, then the empty-cell marker.
fn cell_value(record: &Value, column: &str) -> String {
    let Value::Object(map) = record else {
        return EMPTY_CELL.to_string();
    };
    map.get(&column.to_lowercase())
        .or_else(|| map.get(column))
        .map(display_value)
        .unwrap_or_else(|| EMPTY_CELL.to_string())
}
