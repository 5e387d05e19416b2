//! Actual element heights.
//!
//! Authored heights were measured against sample data (or none). Tables
//! bound to real data can need more room; everything else keeps the size
//! the author gave it.

use serde_json::Value;

use super::LayoutConfig;
use crate::binding::resolve_array;
use crate::model::{Element, ElementKind};

/// The height an element needs once `data` is bound.
///
/// Only ever grows an element: the result is never below the authored
/// `height` or `min_height`.
pub fn estimate_height(element: &Element, data: &Value, config: &LayoutConfig) -> f64 {
    match &element.kind {
        ElementKind::Table(table) => {
            let rows = resolve_array(table.binding.as_deref(), data).len();
            if rows == 0 {
                return element.height;
            }
            let computed = config.table_header_height + rows as f64 * config.table_row_height;
            let floor = element.min_height.unwrap_or(element.height);
            computed.max(floor).max(element.height)
        }
        ElementKind::Text(_) | ElementKind::Line(_) | ElementKind::Image(_) => element.height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(n: usize) -> Value {
        let rows: Vec<Value> = (0..n).map(|i| json!({"item": format!("Row {}", i)})).collect();
        json!({ "items": rows })
    }

    #[test]
    fn test_table_grows_with_rows() {
        let config = LayoutConfig::default();
        let table = Element::table("t", 0.0, 100.0, 500.0, 100.0, &["Item", "Qty"], Some("items"))
            .with_min_height(100.0);
        assert_eq!(estimate_height(&table, &items(5), &config), 240.0);
    }

    #[test]
    fn test_small_tables_keep_authored_height() {
        let config = LayoutConfig::default();
        let table = Element::table("t", 0.0, 100.0, 500.0, 150.0, &["Item"], Some("items"));
        // 40 + 2 * 32 = 104 < 150
        assert_eq!(estimate_height(&table, &items(2), &config), 150.0);
    }

    #[test]
    fn test_empty_or_unbound_tables_keep_authored_height() {
        let config = LayoutConfig::default();
        let bound = Element::table("t", 0.0, 0.0, 500.0, 120.0, &["Item"], Some("items"));
        assert_eq!(estimate_height(&bound, &items(0), &config), 120.0);
        assert_eq!(estimate_height(&bound, &json!({}), &config), 120.0);

        let unbound = Element::table("u", 0.0, 0.0, 500.0, 120.0, &["Item"], None);
        assert_eq!(estimate_height(&unbound, &items(10), &config), 120.0);
    }

    #[test]
    fn test_min_height_raises_floor() {
        let config = LayoutConfig::default();
        let table = Element::table("t", 0.0, 0.0, 500.0, 60.0, &["Item"], Some("items"))
            .with_min_height(200.0);
        assert_eq!(estimate_height(&table, &items(1), &config), 200.0);
    }

    #[test]
    fn test_min_height_below_authored_never_shrinks() {
        let config = LayoutConfig::default();
        let table = Element::table("t", 0.0, 0.0, 500.0, 200.0, &["Item"], Some("items"))
            .with_min_height(50.0);
        assert_eq!(estimate_height(&table, &items(2), &config), 200.0);
    }

    #[test]
    fn test_height_monotonic_in_rows() {
        let config = LayoutConfig::default();
        let table = Element::table("t", 0.0, 0.0, 500.0, 130.0, &["Item"], Some("items"));
        for n in 0..20 {
            assert!(estimate_height(&table, &items(n), &config) >= 130.0);
        }
    }

    #[test]
    fn test_other_elements_use_authored_height() {
        let config = LayoutConfig::default();
        let data = json!({"items": [1, 2, 3]});
        let text = Element::text("x", 0.0, 0.0, 100.0, 40.0, "hi").with_binding("items");
        assert_eq!(estimate_height(&text, &data, &config), 40.0);
        let image = Element::image("i", 0.0, 0.0, 100.0, 80.0, "");
        assert_eq!(estimate_height(&image, &data, &config), 80.0);
    }
}
