//! # Static Markup Writer
//!
//! Serializes a [`VisualTree`] into a self-contained HTML document. Every
//! node becomes one absolutely positioned box at the coordinates the layout
//! engine settled on, so the markup is a faithful preview of the PDF.
//!
//! Shared styling lives in one `<style>` block; only geometry and per-node
//! values are inlined. The output depends on nothing but the tree, which
//! makes it byte-for-byte reproducible.

use std::fmt::Write;

use crate::render::{HorizontalAlign, ImageFit, NodeContent, VisualNode, VisualTree};

const STYLESHEET: &str = "\
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: Helvetica, Arial, sans-serif; background-color: #ffffff; color: #0a0a0a; }
.page { position: relative; background-color: #ffffff; }
.node { position: absolute; overflow: hidden; }
.margin-guide { position: absolute; border: 1px dashed #d4d4d4; pointer-events: none; }
.text { width: 100%; height: 100%; display: flex; align-items: center; padding: 0 8px; }
.text span { overflow: hidden; text-overflow: ellipsis; white-space: nowrap; max-width: 100%; }
.rule { width: 100%; background-color: #0a0a0a; }
.table { width: 100%; font-size: 12px; border-collapse: collapse; table-layout: fixed; }
.table th, .table td { border: 1px solid #e5e7eb; padding: 0 4px; text-align: left; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.table th { background-color: #f5f5f5; font-weight: bold; }
.table td.empty { color: #737373; }
.image { width: 100%; height: 100%; display: flex; align-items: center; justify-content: center; }
.image img { width: 100%; height: 100%; }
.image-placeholder { color: #737373; font-size: 12px; }
";

/// Options for [`to_html`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlOptions {
    /// Draw a dashed outline along the page margin.
    pub margin_guides: bool,
}

/// Render the whole document.
pub fn to_html(tree: &VisualTree, options: &HtmlOptions) -> String {
    let mut out = String::with_capacity(2048 + tree.nodes.len() * 256);

    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>\n");
    out.push_str(STYLESHEET);
    out.push_str("</style>\n</head>\n<body>\n");

    let _ = writeln!(
        out,
        "<div class=\"page\" style=\"width: {}px; min-height: {}px;\">",
        tree.page.width, tree.page.height
    );

    if options.margin_guides {
        let m = tree.page.margin;
        let _ = writeln!(
            out,
            "<div class=\"margin-guide\" style=\"left: {}px; top: {}px; width: {}px; height: {}px;\"></div>",
            m,
            m,
            (tree.page.width - 2.0 * m).max(0.0),
            (tree.page.height - 2.0 * m).max(0.0)
        );
    }

    for node in &tree.nodes {
        write_node(&mut out, node);
    }

    out.push_str("</div>\n</body>\n</html>\n");
    out
}

fn write_node(out: &mut String, node: &VisualNode) {
    let _ = write!(
        out,
        "<div class=\"node\" data-id=\"{}\" style=\"left: {}px; top: {}px; width: {}px; height: {}px;\">",
        escape_html(&node.id),
        node.left,
        node.top,
        node.width,
        node.height
    );

    match &node.content {
        NodeContent::Text {
            text,
            font_size,
            bold,
            align,
        } => {
            let _ = write!(
                out,
                "<div class=\"text\" style=\"font-size: {}px; font-weight: {}; justify-content: {};\"><span>{}</span></div>",
                font_size,
                if *bold { "bold" } else { "normal" },
                justify(*align),
                escape_html(text)
            );
        }
        NodeContent::Rule { thickness } => {
            let _ = write!(out, "<div class=\"rule\" style=\"height: {}px;\"></div>", thickness);
        }
        NodeContent::Table {
            columns,
            rows,
            placeholder,
            header_height,
            row_height,
        } => {
            out.push_str("<table class=\"table\"><thead>");
            let _ = write!(out, "<tr style=\"height: {}px;\">", header_height);
            for column in columns {
                let _ = write!(out, "<th>{}</th>", escape_html(column));
            }
            out.push_str("</tr></thead><tbody>");
            let cell_open = if *placeholder { "<td class=\"empty\">" } else { "<td>" };
            for row in rows {
                let _ = write!(out, "<tr style=\"height: {}px;\">", row_height);
                for cell in row {
                    out.push_str(cell_open);
                    out.push_str(&escape_html(cell));
                    out.push_str("</td>");
                }
                out.push_str("</tr>");
            }
            out.push_str("</tbody></table>");
        }
        NodeContent::Image { src, fit } => {
            let _ = write!(
                out,
                "<div class=\"image\"><img src=\"{}\" alt=\"\" style=\"object-fit: {};\"></div>",
                escape_html(src),
                match fit {
                    ImageFit::Contain => "contain",
                    ImageFit::Fill => "fill",
                }
            );
        }
        NodeContent::ImagePlaceholder => {
            out.push_str("<div class=\"image\"><span class=\"image-placeholder\">[Image]</span></div>");
        }
    }

    out.push_str("</div>\n");
}

fn justify(align: HorizontalAlign) -> &'static str {
    match align {
        HorizontalAlign::Start => "flex-start",
        HorizontalAlign::Center => "center",
        HorizontalAlign::End => "flex-end",
    }
}

/// Escape text for use in element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutConfig;
    use crate::model::{Element, Page, Template};
    use crate::render::render_template;
    use serde_json::json;

    fn tree_for(elements: Vec<Element>, data: serde_json::Value) -> VisualTree {
        let template = Template {
            id: "t".to_string(),
            name: "T".to_string(),
            version: 1,
            page: Page::default(),
            elements,
        };
        render_template(&template, &data, &LayoutConfig::default())
    }

    #[test]
    fn test_document_shell() {
        let html = to_html(&tree_for(vec![], json!({})), &HtmlOptions::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("width: 794px; min-height: 1123px;"));
        assert!(!html.contains("margin-guide\" style"));
    }

    #[test]
    fn test_escapes_content() {
        let tree = tree_for(
            vec![Element::text("t", 0.0, 0.0, 100.0, 20.0, "").with_binding("name")],
            json!({"name": "<b>Tom & \"Jerry\"</b>"}),
        );
        let html = to_html(&tree, &HtmlOptions::default());
        assert!(html.contains("&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;"));
        assert!(!html.contains("<b>Tom"));
    }

    #[test]
    fn test_uses_repositioned_geometry() {
        let data = json!({"items": [{}, {}, {}, {}, {}]});
        let tree = tree_for(
            vec![
                Element::table("tbl", 20.0, 100.0, 500.0, 100.0, &["Item"], Some("items")),
                Element::text("total", 20.0, 210.0, 200.0, 30.0, "Total"),
            ],
            data,
        );
        let html = to_html(&tree, &HtmlOptions::default());
        assert!(html.contains("data-id=\"tbl\" style=\"left: 20px; top: 100px; width: 500px; height: 200px;\""));
        assert!(html.contains("data-id=\"total\" style=\"left: 20px; top: 310px;"));
    }

    #[test]
    fn test_table_and_placeholders() {
        let tree = tree_for(
            vec![
                Element::table("tbl", 0.0, 0.0, 300.0, 100.0, &["Item", "Qty"], Some("items")),
                Element::image("img", 0.0, 200.0, 50.0, 50.0, ""),
            ],
            json!({}),
        );
        let html = to_html(&tree, &HtmlOptions::default());
        assert!(html.contains("<th>Item</th><th>Qty</th>"));
        assert!(html.contains("<td class=\"empty\">\u{2014}</td>"));
        assert!(html.contains("[Image]"));
    }

    #[test]
    fn test_margin_guides() {
        let html = to_html(&tree_for(vec![], json!({})), &HtmlOptions { margin_guides: true });
        assert!(html.contains("class=\"margin-guide\" style=\"left: 20px; top: 20px; width: 754px; height: 1083px;\""));
    }

    #[test]
    fn test_output_is_deterministic() {
        let tree = tree_for(
            vec![
                Element::text("a", 0.0, 0.0, 100.0, 20.0, "x"),
                Element::line("b", 0.0, 40.0, 100.0, 2.0),
            ],
            json!({}),
        );
        let options = HtmlOptions::default();
        assert_eq!(to_html(&tree, &options), to_html(&tree, &options));
    }
}
