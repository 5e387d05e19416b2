use wasm_bindgen::prelude::*;

use crate::html::{to_html, HtmlOptions};
use crate::model::Template;

fn parse(template_json: &str, data_json: &str) -> Result<(Template, serde_json::Value), JsValue> {
    let template = Template::from_json(template_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let data = serde_json::from_str(data_json).map_err(|e| JsValue::from_str(&format!("Invalid data: {}", e)))?;
    Ok((template, data))
}

/// Repositioned visual tree as a JS object.
#[wasm_bindgen]
pub fn layout(template_json: &str, data_json: &str) -> Result<JsValue, JsValue> {
    let (template, data) = parse(template_json, data_json)?;
    let tree = crate::layout(&template, &data);
    serde_wasm_bindgen::to_value(&tree).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Preview markup, optionally with margin guides.
#[wasm_bindgen]
pub fn render_html(template_json: &str, data_json: &str, margin_guides: bool) -> Result<String, JsValue> {
    let (template, data) = parse(template_json, data_json)?;
    Ok(to_html(&crate::layout(&template, &data), &HtmlOptions { margin_guides }))
}

#[wasm_bindgen]
pub fn render_pdf(template_json: &str, data_json: &str) -> Result<Vec<u8>, JsValue> {
    crate::render_json(template_json, data_json).map_err(|e| JsValue::from_str(&e.to_string()))
}
