//! Structured error types for platen.
//!
//! The layout and binding core never fails: unresolved data degrades to
//! placeholders. These variants cover the surrounding system: parsing
//! input, validating pages, looking up stored templates, loading images and
//! producing PDF bytes.

use thiserror::Error;

/// The unified error type returned by all fallible platen APIs.
#[derive(Debug, Error)]
pub enum PlatenError {
    /// JSON input failed to parse as a template, request or config.
    #[error("Failed to parse input: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// A page with non-positive dimensions or a negative margin.
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    /// A generate request that names neither a template nor an inline layout.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The template does not exist or is not owned by the requesting user.
    #[error("Template not found or access denied: {0}")]
    NotFound(String),

    /// A write to a template owned by another user.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// An image source could not be read or decoded.
    #[error("Image error: {0}")]
    Image(String),

    /// The rendering backend failed or is unavailable.
    #[error("Render backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for PlatenError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected shape. Check element `type` tags and field names.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        PlatenError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_carry_a_hint() {
        let err: PlatenError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse input"));
        assert!(msg.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn eof_errors_mention_truncation() {
        let err: PlatenError = serde_json::from_str::<serde_json::Value>("{\"a\": ")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn not_found_names_the_template() {
        let err = PlatenError::NotFound("tpl-1".to_string());
        assert_eq!(err.to_string(), "Template not found or access denied: tpl-1");
    }
}
