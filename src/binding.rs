//! Binding resolution.
//!
//! A binding is a dot-separated path into the runtime data payload
//! (`"invoice.customer.name"`). Resolution never fails: anything that cannot
//! be resolved renders as the literal placeholder `{{path}}`, so an unbound
//! template shows exactly which paths are missing.

use serde_json::Value;

use crate::model::Element;

/// The text shown for a binding path that could not be resolved.
pub fn placeholder(path: &str) -> String {
    format!("{{{{{}}}}}", path)
}

/// Walk `data` along the dot-separated `path`.
///
/// Objects are entered by key and arrays by a decimal index (`items.0.name`).
/// Any other intermediate value, or an index that is non-numeric or out of
/// range, stops the walk.
fn traverse<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = data;
    for part in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(array_index(part)?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Canonical decimal indices only: `"0"` and `"12"`, not `"+1"` or `"01"`.
fn array_index(part: &str) -> Option<usize> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) || (part.len() > 1 && part.starts_with('0')) {
        return None;
    }
    part.parse().ok()
}

/// Resolve a binding to display text.
///
/// Missing segments, scalar intermediates, bad array indices, an empty path
/// and a null final value all yield [`placeholder`].
pub fn resolve_scalar(path: &str, data: &Value) -> String {
    match traverse(data, path) {
        None | Some(Value::Null) => placeholder(path),
        Some(value) => display_value(value),
    }
}

/// Resolve a binding to an array of records.
///
/// Returns an empty slice when the path is absent, does not resolve, or
/// resolves to something other than an array.
pub fn resolve_array<'a>(path: Option<&str>, data: &'a Value) -> &'a [Value] {
    path.and_then(|p| traverse(data, p))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Render a resolved JSON value as text.
///
/// Integral floats print without a fractional part (`9720`, not `9720.0`).
/// Null renders as the empty string; arrays and objects as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// All distinct binding paths used by the elements, in first-appearance order.
pub fn extract_bindings(elements: &[Element]) -> Vec<String> {
    let mut bindings: Vec<String> = Vec::new();
    for path in elements.iter().filter_map(Element::binding) {
        if !bindings.iter().any(|b| b == path) {
            bindings.push(path.to_string());
        }
    }
    bindings
}

/// Bindings that `data` does not satisfy.
///
/// Text bindings count as unresolved when they would render as a
/// placeholder; table bindings when they do not resolve to an array.
pub fn unresolved_bindings(elements: &[Element], data: &Value) -> Vec<String> {
    use crate::model::ElementKind;

    let mut missing: Vec<String> = Vec::new();
    for element in elements {
        let unresolved = match &element.kind {
            ElementKind::Text(text) => text
                .binding
                .as_deref()
                .filter(|path| matches!(traverse(data, path), None | Some(Value::Null))),
            ElementKind::Table(table) => table
                .binding
                .as_deref()
                .filter(|path| !matches!(traverse(data, path), Some(Value::Array(_)))),
            ElementKind::Line(_) | ElementKind::Image(_) => None,
        };
        if let Some(path) = unresolved {
            if !missing.iter().any(|m| m == path) {
                missing.push(path.to_string());
            }
        }
    }
    missing
}
