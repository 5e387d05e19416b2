//! # Generation Service
//!
//! The request path that turns "template + data" into a PDF for a user:
//!
//! ```text
//! GenerateRequest ──► resolve template ──► reposition + render ──► PdfBackend ──► bytes
//!   (stored id or        (TemplateStore,       (VisualTree,           (native writer
//!    inline layout)       ownership checked)    fully built first)     by default)
//! ```
//!
//! The backend only ever sees a finished [`VisualTree`], so any backend
//! produces the same layout as the markup preview.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;

use crate::error::PlatenError;
use crate::html::{to_html, HtmlOptions};
use crate::layout::LayoutConfig;
use crate::model::{Element, Page, Template};
use crate::pdf::{Metadata, PdfWriter};
use crate::render::{render_template, VisualTree};
use crate::store::TemplateStore;

/// Turns a finished visual tree into PDF bytes.
pub trait PdfBackend: Send + Sync {
    fn render_pdf(&self, tree: &VisualTree, metadata: &Metadata) -> Result<Vec<u8>, PlatenError>;
}

/// The built-in backend, backed by [`PdfWriter`].
///
/// Requests carry their own layouts, so by default image sources that name
/// server files are drawn as placeholders.
#[derive(Debug, Clone, Default)]
pub struct NativePdfBackend {
    writer: PdfWriter,
}

impl NativePdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a configured writer, e.g. one allowed to read an asset directory.
    pub fn with_writer(writer: PdfWriter) -> Self {
        Self { writer }
    }
}

impl PdfBackend for NativePdfBackend {
    fn render_pdf(&self, tree: &VisualTree, metadata: &Metadata) -> Result<Vec<u8>, PlatenError> {
        self.writer.write(tree, metadata)
    }
}

/// What to generate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawRequest")]
pub enum GenerateRequest {
    /// A template from the store, by id.
    Stored { template_id: String, data: Value },
    /// A layout sent along with the request.
    Inline {
        elements: Vec<Element>,
        page: Page,
        data: Value,
    },
}

/// Wire shape accepted for both request forms.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    template_id: Option<String>,
    elements: Option<Vec<Element>>,
    page: Option<Page>,
    data: Option<Value>,
}

impl TryFrom<RawRequest> for GenerateRequest {
    type Error = PlatenError;

    fn try_from(raw: RawRequest) -> Result<Self, Self::Error> {
        let data = raw.data.unwrap_or_else(|| Value::Object(Default::default()));
        match (raw.template_id, raw.elements, raw.page) {
            (Some(template_id), _, _) if !template_id.is_empty() => Ok(Self::Stored { template_id, data }),
            (_, Some(elements), Some(page)) => Ok(Self::Inline { elements, page, data }),
            _ => Err(PlatenError::InvalidRequest(
                "provide either templateId or elements and page".to_string(),
            )),
        }
    }
}

impl GenerateRequest {
    /// Parse a request body. A body of the wrong shape is
    /// [`PlatenError::InvalidRequest`]; malformed JSON is a parse error.
    pub fn from_json(json: &str) -> Result<Self, PlatenError> {
        let raw: RawRequest = serde_json::from_str(json)?;
        raw.try_into()
    }

    pub fn data(&self) -> &Value {
        match self {
            Self::Stored { data, .. } | Self::Inline { data, .. } => data,
        }
    }
}

/// A generated PDF and what went into it.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub pdf: Vec<u8>,
    /// Id of the stored template, empty for inline layouts.
    pub template_id: String,
    pub elements_count: usize,
    pub page: Page,
    pub duration: Duration,
}

/// Runs generate requests against a store and a backend.
pub struct Generator {
    store: Arc<dyn TemplateStore>,
    backend: Box<dyn PdfBackend>,
    config: LayoutConfig,
}

impl Generator {
    /// A generator using the native PDF writer.
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self::with_backend(store, Box::new(NativePdfBackend::new()))
    }

    pub fn with_backend(store: Arc<dyn TemplateStore>, backend: Box<dyn PdfBackend>) -> Self {
        Self {
            store,
            backend,
            config: LayoutConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    /// Generate a PDF for `user_id`.
    pub fn generate(&self, user_id: &str, request: &GenerateRequest) -> Result<GeneratedDocument, PlatenError> {
        let start = Instant::now();
        log::info!("generating PDF for user {}", user_id);

        let result = self.run(user_id, request, start);
        match &result {
            Ok(doc) => log::info!(
                "generated PDF for user {}: {} elements, {:?} page, {} bytes in {}ms",
                user_id,
                doc.elements_count,
                doc.page.size,
                doc.pdf.len(),
                doc.duration.as_millis()
            ),
            Err(e) => log::error!(
                "PDF generation failed for user {} after {}ms: {}",
                user_id,
                start.elapsed().as_millis(),
                e
            ),
        }
        result
    }

    /// The markup preview for the same request, as `generate` would lay it out.
    pub fn preview(&self, user_id: &str, request: &GenerateRequest) -> Result<String, PlatenError> {
        let template = self.resolve(user_id, request)?;
        let tree = render_template(&template, request.data(), &self.config);
        Ok(to_html(&tree, &HtmlOptions::default()))
    }

    fn run(&self, user_id: &str, request: &GenerateRequest, start: Instant) -> Result<GeneratedDocument, PlatenError> {
        let template = self.resolve(user_id, request)?;
        let tree = render_template(&template, request.data(), &self.config);
        let pdf = self.backend.render_pdf(&tree, &Metadata::for_template(&template))?;

        Ok(GeneratedDocument {
            pdf,
            template_id: template.id,
            elements_count: template.elements.len(),
            page: template.page,
            duration: start.elapsed(),
        })
    }

    fn resolve(&self, user_id: &str, request: &GenerateRequest) -> Result<Template, PlatenError> {
        let template = match request {
            GenerateRequest::Stored { template_id, .. } => self.store.get(template_id, user_id)?,
            GenerateRequest::Inline { elements, page, .. } => Template {
                page: page.clone(),
                elements: elements.clone(),
                ..Default::default()
            },
        };
        template.page.validate()?;
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::FileAccess;
    use crate::store::MemoryStore;
    use serde_json::json;

    struct FailingBackend;

    impl PdfBackend for FailingBackend {
        fn render_pdf(&self, _tree: &VisualTree, _metadata: &Metadata) -> Result<Vec<u8>, PlatenError> {
            Err(PlatenError::Backend("renderer unavailable".to_string()))
        }
    }

    /// Records the tree it was handed.
    struct CapturingBackend(std::sync::Mutex<Option<VisualTree>>);

    impl PdfBackend for CapturingBackend {
        fn render_pdf(&self, tree: &VisualTree, _metadata: &Metadata) -> Result<Vec<u8>, PlatenError> {
            *self.0.lock().unwrap() = Some(tree.clone());
            Ok(b"%PDF-stub".to_vec())
        }
    }

    fn store_with_invoice() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let template = Template {
            id: "inv".to_string(),
            name: "Invoice".to_string(),
            elements: vec![Element::text("total", 20.0, 20.0, 200.0, 30.0, "Total").with_binding("total")],
            ..Default::default()
        };
        store.put("alice", template).unwrap();
        store
    }

    #[test]
    fn test_parse_stored_request() {
        let req = GenerateRequest::from_json(r#"{"templateId": "inv", "data": {"total": 5}}"#).unwrap();
        assert_eq!(
            req,
            GenerateRequest::Stored {
                template_id: "inv".to_string(),
                data: json!({"total": 5})
            }
        );
    }

    #[test]
    fn test_parse_inline_request_defaults_data() {
        let req = GenerateRequest::from_json(
            r#"{"elements": [], "page": {"width": 794, "height": 1123, "margin": 20, "size": "A4", "orientation": "portrait"}}"#,
        )
        .unwrap();
        assert!(matches!(req, GenerateRequest::Inline { .. }));
        assert_eq!(req.data(), &json!({}));
    }

    #[test]
    fn test_parse_rejects_incomplete_request() {
        let err = GenerateRequest::from_json(r#"{"elements": []}"#).unwrap_err();
        assert!(matches!(err, PlatenError::InvalidRequest(_)));
        let err = GenerateRequest::from_json(r#"{"templateId": ""}"#).unwrap_err();
        assert!(matches!(err, PlatenError::InvalidRequest(_)));
        let err = GenerateRequest::from_json("{").unwrap_err();
        assert!(matches!(err, PlatenError::Parse { .. }));
    }

    #[test]
    fn test_generate_from_store() {
        let generator = Generator::new(store_with_invoice());
        let req = GenerateRequest::Stored {
            template_id: "inv".to_string(),
            data: json!({"total": "$50"}),
        };
        let doc = generator.generate("alice", &req).unwrap();
        assert!(doc.pdf.starts_with(b"%PDF-1.7"));
        assert_eq!(doc.template_id, "inv");
        assert_eq!(doc.elements_count, 1);
    }

    #[test]
    fn test_foreign_template_is_not_found() {
        let generator = Generator::new(store_with_invoice());
        let req = GenerateRequest::Stored {
            template_id: "inv".to_string(),
            data: json!({}),
        };
        assert!(matches!(generator.generate("bob", &req), Err(PlatenError::NotFound(_))));
    }

    #[test]
    fn test_invalid_inline_page() {
        let generator = Generator::new(Arc::new(MemoryStore::new()));
        let mut page = Page::default();
        page.height = -1.0;
        let req = GenerateRequest::Inline {
            elements: vec![],
            page,
            data: json!({}),
        };
        assert!(matches!(generator.generate("alice", &req), Err(PlatenError::InvalidPage(_))));
    }

    #[test]
    fn test_backend_failure_propagates() {
        let generator = Generator::with_backend(store_with_invoice(), Box::new(FailingBackend));
        let req = GenerateRequest::Stored {
            template_id: "inv".to_string(),
            data: json!({}),
        };
        assert!(matches!(generator.generate("alice", &req), Err(PlatenError::Backend(_))));
    }

    #[test]
    fn test_backend_receives_bound_tree() {
        let backend = Arc::new(CapturingBackend(std::sync::Mutex::new(None)));
        struct Shared(Arc<CapturingBackend>);
        impl PdfBackend for Shared {
            fn render_pdf(&self, tree: &VisualTree, metadata: &Metadata) -> Result<Vec<u8>, PlatenError> {
                self.0.render_pdf(tree, metadata)
            }
        }

        let generator = Generator::with_backend(store_with_invoice(), Box::new(Shared(backend.clone())));
        let req = GenerateRequest::Stored {
            template_id: "inv".to_string(),
            data: json!({"total": "$50"}),
        };
        generator.generate("alice", &req).unwrap();
        let tree = backend.0.lock().unwrap().clone().unwrap();
        assert_eq!(
            tree.nodes[0].content,
            crate::render::NodeContent::Text {
                text: "$50".to_string(),
                font_size: 14.0,
                bold: false,
                align: crate::render::HorizontalAlign::Start,
            }
        );
    }

    #[test]
    fn test_inline_file_image_is_placeholder() {
        let path = std::env::temp_dir().join(format!("platen-service-{}.png", std::process::id()));
        image::RgbImage::from_pixel(2, 2, image::Rgb([200, 0, 0])).save(&path).unwrap();
        let req = GenerateRequest::Inline {
            elements: vec![Element::image("logo", 0.0, 0.0, 100.0, 100.0, &path.to_string_lossy())],
            page: Page::default(),
            data: json!({}),
        };

        let doc = Generator::new(Arc::new(MemoryStore::new())).generate("alice", &req).unwrap();
        let pdf = String::from_utf8_lossy(&doc.pdf);
        assert!(!pdf.contains("/Subtype /Image"));

        let dir = path.parent().unwrap().to_path_buf();
        let backend = NativePdfBackend::with_writer(PdfWriter::new().with_file_access(FileAccess::Within(dir)));
        let doc = Generator::with_backend(Arc::new(MemoryStore::new()), Box::new(backend))
            .generate("alice", &req)
            .unwrap();
        assert!(String::from_utf8_lossy(&doc.pdf).contains("/Subtype /Image"));
    }

    #[test]
    fn test_preview_matches_request() {
        let generator = Generator::new(store_with_invoice());
        let req = GenerateRequest::Stored {
            template_id: "inv".to_string(),
            data: json!({"total": "$50"}),
        };
        let html = generator.preview("alice", &req).unwrap();
        assert!(html.contains("<span>$50</span>"));
    }
}
