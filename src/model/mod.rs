//! # Template Model
//!
//! The input representation: a fixed-size page plus a flat list of
//! absolutely positioned elements, exactly as a design surface authored
//! them. Positions and sizes are in page pixels (96 DPI).
//!
//! Element order is paint order. Layout order is derived from the authored
//! Y coordinate by the layout engine, never from this list.

use serde::{Deserialize, Serialize};

use crate::error::PlatenError;

/// A stored or inline template: page configuration and elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Incremented by the store on every persisted update.
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub page: Page,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Template {
    /// Parse a template from JSON and validate its page.
    pub fn from_json(json: &str) -> Result<Self, PlatenError> {
        let template: Template = serde_json::from_str(json)?;
        template.page.validate()?;
        Ok(template)
    }
}

/// Page configuration. Set by the template author, immutable while rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub margin: f64,
    #[serde(default)]
    pub size: PageSize,
    #[serde(default)]
    pub orientation: Orientation,
}

impl Default for Page {
    fn default() -> Self {
        Self::new(PageSize::A4, Orientation::Portrait)
    }
}

impl Page {
    /// A page with dimensions taken from the named size table.
    pub fn new(size: PageSize, orientation: Orientation) -> Self {
        let (width, height) = size.dimensions(orientation);
        Self {
            width,
            height,
            margin: 20.0,
            size,
            orientation,
        }
    }

    /// Switch to another named size, keeping the orientation.
    pub fn with_size(&self, size: PageSize) -> Self {
        let (width, height) = size.dimensions(self.orientation);
        Self {
            width,
            height,
            size,
            ..self.clone()
        }
    }

    /// Switch orientation, keeping the named size.
    pub fn with_orientation(&self, orientation: Orientation) -> Self {
        let (width, height) = self.size.dimensions(orientation);
        Self {
            width,
            height,
            orientation,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), PlatenError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(PlatenError::InvalidPage(format!(
                "width and height must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.margin >= 0.0) {
            return Err(PlatenError::InvalidPage(format!(
                "margin must not be negative, got {}",
                self.margin
            )));
        }
        Ok(())
    }
}

/// Named page sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    A3,
    A5,
}

impl PageSize {
    /// Returns (width, height) in pixels for the given orientation.
    pub fn dimensions(&self, orientation: Orientation) -> (f64, f64) {
        let (w, h) = match self {
            PageSize::A4 => (794.0, 1123.0),
            PageSize::Letter => (816.0, 1056.0),
            PageSize::Legal => (816.0, 1344.0),
            PageSize::A3 => (1123.0, 1587.0),
            PageSize::A5 => (559.0, 794.0),
        };
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// A positioned element on the page.
///
/// The common geometry lives here; everything specific to one element type
/// lives in [`ElementKind`], discriminated by the JSON `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Stable identity. Never used for ordering.
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Lower bound for data-driven heights.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<f64>,
    #[serde(flatten)]
    pub kind: ElementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Text(TextElement),
    Line(LineElement),
    Table(TableElement),
    Image(ImageElement),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    /// Literal text, and the design-time fallback when a binding is set.
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
}

fn default_font_size() -> f64 {
    14.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineElement {
    #[serde(default = "default_thickness")]
    pub thickness: f64,
}

fn default_thickness() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableElement {
    /// Column headers, in display order.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Dotted path to an array of records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    #[serde(default)]
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintain_aspect_ratio: Option<bool>,
    /// Width / height of the source asset, known once it has loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_aspect_ratio: Option<f64>,
}

impl ImageElement {
    pub fn keeps_aspect_ratio(&self) -> bool {
        self.maintain_aspect_ratio.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl Element {
    /// Create a text element.
    pub fn text(id: &str, x: f64, y: f64, width: f64, height: f64, content: &str) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            width,
            height,
            min_height: None,
            kind: ElementKind::Text(TextElement {
                content: content.to_string(),
                font_size: default_font_size(),
                font_weight: FontWeight::Normal,
                align: TextAlign::Left,
                binding: None,
            }),
        }
    }

    /// Create a horizontal rule.
    pub fn line(id: &str, x: f64, y: f64, width: f64, thickness: f64) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            width,
            height: thickness,
            min_height: None,
            kind: ElementKind::Line(LineElement { thickness }),
        }
    }

    /// Create a table element.
    pub fn table(
        id: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        columns: &[&str],
        binding: Option<&str>,
    ) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            width,
            height,
            min_height: None,
            kind: ElementKind::Table(TableElement {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                binding: binding.map(str::to_string),
            }),
        }
    }

    /// Create an image element.
    pub fn image(id: &str, x: f64, y: f64, width: f64, height: f64, src: &str) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            width,
            height,
            min_height: None,
            kind: ElementKind::Image(ImageElement {
                src: src.to_string(),
                maintain_aspect_ratio: None,
                natural_aspect_ratio: None,
            }),
        }
    }

    /// Attach a binding path. Lines and images have no binding and are
    /// returned unchanged.
    pub fn with_binding(mut self, path: &str) -> Self {
        match &mut self.kind {
            ElementKind::Text(text) => text.binding = Some(path.to_string()),
            ElementKind::Table(table) => table.binding = Some(path.to_string()),
            ElementKind::Line(_) | ElementKind::Image(_) => {}
        }
        self
    }

    pub fn with_min_height(mut self, min_height: f64) -> Self {
        self.min_height = Some(min_height);
        self
    }

    /// The binding path, for the element types that support one.
    pub fn binding(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Text(text) => text.binding.as_deref(),
            ElementKind::Table(table) => table.binding.as_deref(),
            ElementKind::Line(_) | ElementKind::Image(_) => None,
        }
    }

    /// The element type tag as it appears in JSON.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ElementKind::Text(_) => "text",
            ElementKind::Line(_) => "line",
            ElementKind::Table(_) => "table",
            ElementKind::Image(_) => "image",
        }
    }
}
