//! # Row-Based Repositioning
//!
//! Templates are authored as absolutely positioned elements, laid out
//! against sample data or none at all. At render time a bound table can
//! hold many more rows than it did at design time, and drawing it at its
//! authored box would either clip the table or paint it over whatever the
//! author placed below.
//!
//! The repair is to treat the page as a stack of rows:
//!
//! 1. Sort elements by authored Y and group them into rows (elements whose
//!    Y values chain together within a small tolerance).
//! 2. Measure each element's actual height with the data bound.
//! 3. Stack the rows with a running cursor: the first row stays where the
//!    author put it, every following row starts a fixed gap below the
//!    tallest element of the row above.
//!
//! Horizontal positions are never touched, and all elements of a row share
//! the same final Y.

pub mod collision;
pub mod height;
pub mod rows;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PlatenError;
use crate::model::Element;

pub use height::estimate_height;
pub use rows::group_rows;

/// Layout constants, in page pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Maximum Y distance between neighbouring elements of one row.
    pub row_tolerance: f64,
    /// Vertical gap inserted between stacked rows.
    pub row_gap: f64,
    /// Height of a table's header band.
    pub table_header_height: f64,
    /// Height of each bound table row.
    pub table_row_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_tolerance: 5.0,
            row_gap: 10.0,
            table_header_height: 40.0,
            table_row_height: 32.0,
        }
    }
}

impl LayoutConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, PlatenError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// An element with its final vertical placement.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedElement<'a> {
    pub element: &'a Element,
    /// Position in the template's element list (paint order).
    pub index: usize,
    /// Row this element was grouped into, top to bottom.
    pub row: usize,
    /// Final top edge.
    pub y: f64,
    /// Final height, at least the authored height.
    pub height: f64,
}

impl PlacedElement<'_> {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// The layout engine. Holds only configuration; every call is independent.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Actual height of one element with `data` bound.
    pub fn estimate_height(&self, element: &Element, data: &Value) -> f64 {
        estimate_height(element, data, &self.config)
    }

    /// Restack `elements` row by row using their data-dependent heights.
    ///
    /// Output is in row order. Every input element appears exactly once.
    pub fn reposition<'a>(&self, elements: &'a [Element], data: &Value) -> Vec<PlacedElement<'a>> {
        let rows = group_rows(elements, self.config.row_tolerance);
        let Some(first) = rows.first().and_then(|row| row.first()) else {
            return Vec::new();
        };

        let mut cursor = elements[*first].y;
        let mut placed = Vec::with_capacity(elements.len());

        for (row_idx, row) in rows.iter().enumerate() {
            let heights: Vec<f64> = row
                .iter()
                .map(|&i| self.estimate_height(&elements[i], data))
                .collect();
            let row_height = heights.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            for (&i, &height) in row.iter().zip(&heights) {
                placed.push(PlacedElement {
                    element: &elements[i],
                    index: i,
                    row: row_idx,
                    y: cursor,
                    height,
                });
            }

            cursor += row_height + self.config.row_gap;
        }

        log::debug!(
            "repositioned {} elements into {} rows, content ends at y={:.1}",
            placed.len(),
            rows.len(),
            cursor - self.config.row_gap
        );
        placed
    }

    /// The no-data placement: authored positions and heights, unchanged.
    pub fn place_authored<'a>(&self, elements: &'a [Element]) -> Vec<PlacedElement<'a>> {
        let rows = group_rows(elements, self.config.row_tolerance);
        let mut placed = Vec::with_capacity(elements.len());
        for (row_idx, row) in rows.iter().enumerate() {
            for &i in row {
                placed.push(PlacedElement {
                    element: &elements[i],
                    index: i,
                    row: row_idx,
                    y: elements[i].y,
                    height: elements[i].height,
                });
            }
        }
        placed
    }
}

/// Restack `elements` with the default [`LayoutConfig`].
pub fn reposition<'a>(elements: &'a [Element], data: &Value) -> Vec<PlacedElement<'a>> {
    LayoutEngine::new().reposition(elements, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_at(id: &str, y: f64, height: f64) -> Element {
        Element::text(id, 20.0, y, 200.0, height, id)
    }

    fn find<'a>(placed: &'a [PlacedElement], id: &str) -> &'a PlacedElement<'a> {
        placed.iter().find(|p| p.element.id == id).unwrap()
    }

    #[test]
    fn test_empty_template() {
        assert!(reposition(&[], &json!({})).is_empty());
    }

    #[test]
    fn test_single_element_keeps_position() {
        let elements = vec![text_at("title", 50.0, 40.0)];
        let placed = reposition(&elements, &json!({}));
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].y, 50.0);
        assert_eq!(placed[0].height, 40.0);
    }

    #[test]
    fn test_rows_stack_with_gap() {
        let elements = vec![
            text_at("a", 50.0, 40.0),
            text_at("b", 53.0, 30.0),
            text_at("c", 200.0, 20.0),
        ];
        let placed = reposition(&elements, &json!({}));
        assert_eq!(find(&placed, "a").y, 50.0);
        assert_eq!(find(&placed, "b").y, 50.0);
        assert_eq!(find(&placed, "a").row, find(&placed, "b").row);
        // Row height is the tallest element (40) plus the 10px gap.
        assert_eq!(find(&placed, "c").y, 100.0);
    }

    #[test]
    fn test_table_pushes_following_rows_down() {
        let mut rows = Vec::new();
        for i in 0..5 {
            rows.push(json!({"item": format!("Item {}", i), "qty": i}));
        }
        let data = json!({ "items": rows });
        let elements = vec![
            Element::table("tbl", 20.0, 100.0, 500.0, 100.0, &["Item", "Qty"], Some("items"))
                .with_min_height(100.0),
            text_at("total", 210.0, 30.0),
        ];
        let placed = reposition(&elements, &data);
        let table = find(&placed, "tbl");
        assert_eq!(table.y, 100.0);
        assert_eq!(table.height, 240.0);
        assert!(find(&placed, "total").y >= 350.0);
    }

    #[test]
    fn test_x_is_untouched() {
        let mut elements = vec![text_at("a", 10.0, 20.0), text_at("b", 100.0, 20.0)];
        elements[1].x = 333.0;
        let placed = reposition(&elements, &json!({}));
        assert_eq!(find(&placed, "b").element.x, 333.0);
    }

    #[test]
    fn test_every_element_placed_once() {
        let elements: Vec<Element> = (0..12)
            .map(|i| text_at(&format!("e{}", i), ((i * 37) % 200) as f64, 15.0))
            .collect();
        let placed = reposition(&elements, &json!({}));
        let mut indices: Vec<usize> = placed.iter().map(|p| p.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_rows_never_overlap() {
        let data = json!({"items": [{}, {}, {}, {}, {}, {}, {}, {}]});
        let elements = vec![
            text_at("header", 20.0, 60.0),
            Element::table("t1", 20.0, 90.0, 300.0, 80.0, &["A"], Some("items")),
            text_at("side", 92.0, 300.0),
            Element::table("t2", 20.0, 180.0, 300.0, 80.0, &["A"], Some("items")),
            text_at("footer", 190.0, 10.0),
            Element::line("rule", 20.0, 400.0, 500.0, 2.0),
        ];
        let placed = reposition(&elements, &data);
        for a in &placed {
            for b in &placed {
                if a.row < b.row {
                    assert!(a.bottom() <= b.y, "{} overlaps {}", a.element.id, b.element.id);
                }
            }
        }
    }

    #[test]
    fn test_place_authored_keeps_geometry() {
        let elements = vec![text_at("a", 300.0, 40.0), text_at("b", 20.0, 10.0)];
        let placed = LayoutEngine::new().place_authored(&elements);
        assert_eq!(find(&placed, "a").y, 300.0);
        assert_eq!(find(&placed, "b").y, 20.0);
        assert_eq!(find(&placed, "a").height, 40.0);
    }

    #[test]
    fn test_custom_gap() {
        let engine = LayoutEngine::with_config(LayoutConfig {
            row_gap: 0.0,
            ..Default::default()
        });
        let elements = vec![text_at("a", 0.0, 40.0), text_at("b", 500.0, 40.0)];
        let placed = engine.reposition(&elements, &json!({}));
        assert_eq!(find(&placed, "b").y, 40.0);
    }

    #[test]
    fn test_config_from_json_fills_defaults() {
        let config = LayoutConfig::from_json(r#"{"rowGap": 4}"#).unwrap();
        assert_eq!(config.row_gap, 4.0);
        assert_eq!(config.row_tolerance, 5.0);
        assert_eq!(config.table_row_height, 32.0);
    }
}
