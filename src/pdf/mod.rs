//! # PDF Writer
//!
//! Serializes a [`VisualTree`] straight to PDF 1.7 bytes. The writer draws
//! exactly the boxes the tree holds, so the PDF matches the markup preview
//! node for node.
//!
//! ```text
//! %PDF-1.7
//! 1 0 obj  Catalog
//! 2 0 obj  Pages
//! 3 0 obj  Helvetica        (F0)
//! 4 0 obj  Helvetica-Bold   (F1)
//! ...      image XObjects, then a content stream + page per page
//! xref / trailer / %%EOF
//! ```
//!
//! Content streams are written in page pixels under a single
//! `0.75 0 0 0.75 0 0 cm`, so one CSS pixel maps to 0.75pt. A tree taller
//! than the page continues on further pages of the same size: each node is
//! drawn on the page that holds its top edge. Only pages that hold a node
//! are written, at most [`MAX_PAGES`] of them.

pub mod encoding;

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::PlatenError;
use crate::font::StandardFont;
use crate::image_loader::{load_image, FileAccess, ImageData, LoadedImage};
use crate::model::Template;
use crate::render::{HorizontalAlign, ImageFit, NodeContent, VisualNode, VisualTree};

use encoding::pdf_literal;

/// Points per CSS pixel.
pub const PT_PER_PX: f64 = 0.75;

/// Most pages a single document may have.
pub const MAX_PAGES: usize = 1000;

const TEXT_PADDING: f64 = 8.0;
const CELL_PADDING: f64 = 4.0;
const TABLE_FONT_SIZE: f64 = 12.0;

#[derive(Debug, Clone, Copy)]
struct Rgb(f64, f64, f64);

const INK: Rgb = Rgb(0.039, 0.039, 0.039);
const MUTED: Rgb = Rgb(0.451, 0.451, 0.451);
const BORDER: Rgb = Rgb(0.898, 0.906, 0.922);
const HEADER_FILL: Rgb = Rgb(0.961, 0.961, 0.961);
const PLACEHOLDER_FILL: Rgb = Rgb(0.898, 0.898, 0.898);

/// Document information written to the Info dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

impl Metadata {
    /// Title taken from the template name, when it has one.
    pub fn for_template(template: &Template) -> Self {
        Self {
            title: (!template.name.is_empty()).then(|| template.name.clone()),
            ..Default::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.subject.is_none()
    }
}

/// Object list under construction. Index 0 is the free-list head.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
    /// Image XObject id per distinct source, or `None` if it failed to load.
    images: HashMap<String, Option<ImageRef>>,
}

#[derive(Debug, Clone, Copy)]
struct ImageRef {
    /// Resource index, drawn as `/ImN`.
    index: usize,
    object_id: usize,
    aspect_ratio: f64,
}

impl PdfBuilder {
    fn new() -> Self {
        Self {
            objects: vec![Vec::new()],
            images: HashMap::new(),
        }
    }

    fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len() - 1
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    fn push_stream(&mut self, dict: &str, body: &[u8]) -> usize {
        let mut data = Vec::with_capacity(body.len() + dict.len() + 32);
        let _ = writeln!(data, "<< {} /Length {} >>\nstream", dict, body.len());
        data.extend_from_slice(body);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    file_access: FileAccess,
}

impl PdfWriter {
    /// A writer that embeds inline image data only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow image sources that name files, within `access`.
    pub fn with_file_access(mut self, access: FileAccess) -> Self {
        self.file_access = access;
        self
    }

    /// Write the whole tree as a PDF document.
    pub fn write(&self, tree: &VisualTree, metadata: &Metadata) -> Result<Vec<u8>, PlatenError> {
        let page_height = tree.page.height;
        if !(tree.page.width > 0.0 && page_height > 0.0) {
            return Err(PlatenError::InvalidPage(format!(
                "cannot write a {}x{} page",
                tree.page.width, page_height
            )));
        }

        let mut builder = PdfBuilder::new();
        let catalog_id = builder.reserve();
        let pages_id = builder.reserve();
        let font_ids: Vec<usize> = [StandardFont::Helvetica, StandardFont::HelveticaBold]
            .iter()
            .map(|font| {
                builder.push(
                    format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                        font.pdf_name()
                    )
                    .into_bytes(),
                )
            })
            .collect();

        self.register_images(&mut builder, tree);

        let mut resources = format!("/Font << /F0 {} 0 R /F1 {} 0 R >>", font_ids[0], font_ids[1]);
        let mut image_refs: Vec<ImageRef> = builder.images.values().flatten().copied().collect();
        image_refs.sort_by_key(|r| r.index);
        if !image_refs.is_empty() {
            resources.push_str(" /XObject <<");
            for r in &image_refs {
                let _ = write!(resources, " /Im{} {} 0 R", r.index, r.object_id);
            }
            resources.push_str(" >>");
        }

        let pages = paginate(tree)?;
        let mut page_ids = Vec::with_capacity(pages.len());
        for (page_idx, nodes) in &pages {
            let offset = *page_idx as f64 * page_height;
            let mut stream = String::new();
            let _ = writeln!(stream, "{} 0 0 {} 0 0 cm", PT_PER_PX, PT_PER_PX);
            for node in nodes {
                self.write_node(&mut stream, node, page_height, offset, &builder);
            }

            let compressed = compress_to_vec_zlib(stream.as_bytes(), 6);
            let content_id = builder.push_stream("/Filter /FlateDecode", &compressed);
            let page_id = builder.push(
                format!(
                    "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] /Contents {} 0 R /Resources << {} >> >>",
                    pages_id,
                    tree.page.width * PT_PER_PX,
                    page_height * PT_PER_PX,
                    content_id,
                    resources
                )
                .into_bytes(),
            );
            page_ids.push(page_id);
        }

        builder.objects[catalog_id] = format!("<< /Type /Catalog /Pages {} 0 R >>", pages_id).into_bytes();
        let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
        builder.objects[pages_id] =
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), page_ids.len()).into_bytes();

        let info_id = (!metadata.is_empty()).then(|| {
            let mut info = String::from("<< ");
            for (key, value) in [
                ("Title", &metadata.title),
                ("Author", &metadata.author),
                ("Subject", &metadata.subject),
            ] {
                if let Some(value) = value {
                    let _ = write!(info, "/{} ({}) ", key, pdf_literal(value));
                }
            }
            info.push_str("/Producer (platen) >>");
            builder.push(info.into_bytes())
        });

        log::debug!(
            "wrote {} nodes on {} page(s), {} image(s)",
            tree.nodes.len(),
            page_ids.len(),
            image_refs.len()
        );

        Ok(serialize(&builder, catalog_id, info_id))
    }

    /// Load every distinct image source once. Failures are remembered so
    /// the node falls back to the placeholder.
    fn register_images(&self, builder: &mut PdfBuilder, tree: &VisualTree) {
        let mut next_index = 0;
        for node in &tree.nodes {
            let NodeContent::Image { src, .. } = &node.content else {
                continue;
            };
            if builder.images.contains_key(src) {
                continue;
            }
            let entry = match load_image(src, &self.file_access) {
                Ok(image) => {
                    let object_id = write_image_xobject(builder, &image);
                    let r = ImageRef {
                        index: next_index,
                        object_id,
                        aspect_ratio: image.aspect_ratio(),
                    };
                    next_index += 1;
                    Some(r)
                }
                Err(e) => {
                    log::warn!("image '{}' drawn as placeholder: {}", node.id, e);
                    None
                }
            };
            builder.images.insert(src.clone(), entry);
        }
    }

    fn write_node(&self, stream: &mut String, node: &VisualNode, page_height: f64, offset: f64, builder: &PdfBuilder) {
        let b = Frame {
            x: node.left,
            top: node.top - offset,
            w: node.width,
            h: node.height,
            page_height,
        };

        match &node.content {
            NodeContent::Text {
                text,
                font_size,
                bold,
                align,
            } => {
                stream.push_str("q\n");
                b.clip(stream);
                let font = StandardFont::for_weight(*bold);
                let inner = (b.w - 2.0 * TEXT_PADDING).max(0.0);
                let fitted = font.truncate(text, *font_size, inner);
                let tw = font.measure(&fitted, *font_size);
                let x = match align {
                    HorizontalAlign::Start => b.x + TEXT_PADDING,
                    HorizontalAlign::Center => b.x + (b.w - tw) / 2.0,
                    HorizontalAlign::End => b.x + b.w - TEXT_PADDING - tw,
                };
                draw_text(stream, font, *font_size, INK, x, b.centre_baseline(font, *font_size), &fitted);
                stream.push_str("Q\n");
            }
            NodeContent::Rule { thickness } => {
                fill_rect(stream, INK, b.x, b.pdf_y(b.top + thickness), b.w, *thickness);
            }
            NodeContent::Table {
                columns,
                rows,
                placeholder,
                header_height,
                row_height,
            } => {
                stream.push_str("q\n");
                b.clip(stream);
                self.write_table(stream, &b, columns, rows, *placeholder, *header_height, *row_height);
                stream.push_str("Q\n");
            }
            NodeContent::Image { src, fit } => match builder.images.get(src).copied().flatten() {
                Some(image) => {
                    let (w, h) = match fit {
                        ImageFit::Fill => (b.w, b.h),
                        ImageFit::Contain => contain(b.w, b.h, image.aspect_ratio),
                    };
                    let x = b.x + (b.w - w) / 2.0;
                    let top = b.top + (b.h - h) / 2.0;
                    let _ = writeln!(
                        stream,
                        "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ",
                        w,
                        h,
                        x,
                        b.pdf_y(top + h),
                        image.index
                    );
                }
                None => self.write_image_placeholder(stream, &b),
            },
            NodeContent::ImagePlaceholder => self.write_image_placeholder(stream, &b),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn write_table(
        &self,
        stream: &mut String,
        b: &Frame,
        columns: &[String],
        rows: &[Vec<String>],
        placeholder: bool,
        header_height: f64,
        row_height: f64,
    ) {
        if columns.is_empty() {
            return;
        }
        let col_w = b.w / columns.len() as f64;
        let cell_inner = (col_w - 2.0 * CELL_PADDING).max(0.0);

        fill_rect(stream, HEADER_FILL, b.x, b.pdf_y(b.top + header_height), b.w, header_height);

        let bold = StandardFont::HelveticaBold;
        let regular = StandardFont::Helvetica;
        let baseline = |top: f64, band: f64, font: StandardFont| {
            b.pdf_y(top + band / 2.0 + font.baseline_offset(TABLE_FONT_SIZE))
        };

        for (i, column) in columns.iter().enumerate() {
            let x = b.x + i as f64 * col_w;
            let text = bold.truncate(column, TABLE_FONT_SIZE, cell_inner);
            draw_text(
                stream,
                bold,
                TABLE_FONT_SIZE,
                INK,
                x + CELL_PADDING,
                baseline(b.top, header_height, bold),
                &text,
            );
        }

        let colour = if placeholder { MUTED } else { INK };
        for (r, row) in rows.iter().enumerate() {
            let top = b.top + header_height + r as f64 * row_height;
            for (i, cell) in row.iter().enumerate().take(columns.len()) {
                let x = b.x + i as f64 * col_w;
                let text = regular.truncate(cell, TABLE_FONT_SIZE, cell_inner);
                draw_text(
                    stream,
                    regular,
                    TABLE_FONT_SIZE,
                    colour,
                    x + CELL_PADDING,
                    baseline(top, row_height, regular),
                    &text,
                );
            }
        }

        // Grid: one stroked rectangle per cell, header included.
        let _ = writeln!(stream, "{:.3} {:.3} {:.3} RG\n1 w", BORDER.0, BORDER.1, BORDER.2);
        let bands = std::iter::once((b.top, header_height))
            .chain((0..rows.len()).map(|r| (b.top + header_height + r as f64 * row_height, row_height)));
        for (top, height) in bands {
            for i in 0..columns.len() {
                let x = b.x + i as f64 * col_w;
                let _ = writeln!(stream, "{:.2} {:.2} {:.2} {:.2} re", x, b.pdf_y(top + height), col_w, height);
            }
        }
        stream.push_str("S\n");
    }

    fn write_image_placeholder(&self, stream: &mut String, b: &Frame) {
        fill_rect(stream, PLACEHOLDER_FILL, b.x, b.pdf_y(b.top + b.h), b.w, b.h);
        let font = StandardFont::Helvetica;
        let label = font.truncate("[Image]", TABLE_FONT_SIZE, b.w);
        let tw = font.measure(&label, TABLE_FONT_SIZE);
        draw_text(
            stream,
            font,
            TABLE_FONT_SIZE,
            MUTED,
            b.x + (b.w - tw) / 2.0,
            b.centre_baseline(font, TABLE_FONT_SIZE),
            &label,
        );
    }
}

/// A node box on the current page, in top-down pixels.
struct Frame {
    x: f64,
    top: f64,
    w: f64,
    h: f64,
    page_height: f64,
}

impl Frame {
    /// Flip a top-down Y into PDF's bottom-up space.
    fn pdf_y(&self, y: f64) -> f64 {
        self.page_height - y
    }

    fn centre_baseline(&self, font: StandardFont, font_size: f64) -> f64 {
        self.pdf_y(self.top + self.h / 2.0 + font.baseline_offset(font_size))
    }

    fn clip(&self, stream: &mut String) {
        let _ = writeln!(
            stream,
            "{:.2} {:.2} {:.2} {:.2} re W n",
            self.x,
            self.pdf_y(self.top + self.h),
            self.w,
            self.h
        );
    }
}

fn fill_rect(stream: &mut String, colour: Rgb, x: f64, y: f64, w: f64, h: f64) {
    let _ = writeln!(
        stream,
        "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ",
        colour.0, colour.1, colour.2, x, y, w, h
    );
}

fn draw_text(stream: &mut String, font: StandardFont, size: f64, colour: Rgb, x: f64, y: f64, text: &str) {
    if text.is_empty() {
        return;
    }
    let _ = writeln!(
        stream,
        "BT\n{:.3} {:.3} {:.3} rg\n/{} {:.1} Tf\n{:.2} {:.2} Td\n({}) Tj\nET",
        colour.0,
        colour.1,
        colour.2,
        font.resource_name(),
        size,
        x,
        y,
        pdf_literal(text)
    );
}

/// Largest `aspect`-shaped size inside `w` x `h`.
fn contain(w: f64, h: f64, aspect: f64) -> (f64, f64) {
    if aspect <= 0.0 || h <= 0.0 {
        return (w, h);
    }
    if w / h > aspect {
        (h * aspect, h)
    } else {
        (w, w / aspect)
    }
}

/// Group nodes by the index of the page holding their top edge, keeping
/// paint order. Pages without nodes are skipped; an empty tree still gets
/// one blank page.
fn paginate(tree: &VisualTree) -> Result<Vec<(usize, Vec<&VisualNode>)>, PlatenError> {
    let page_height = tree.page.height;
    let mut pages: BTreeMap<usize, Vec<&VisualNode>> = BTreeMap::new();
    for node in &tree.nodes {
        // Float to usize saturates, so a far-off top is just a large index.
        let idx = (node.top.max(0.0) / page_height).floor() as usize;
        pages.entry(idx).or_default().push(node);
        if pages.len() > MAX_PAGES {
            return Err(PlatenError::InvalidPage(format!(
                "content spans more than {} pages",
                MAX_PAGES
            )));
        }
    }
    if pages.is_empty() {
        pages.insert(0, Vec::new());
    }
    Ok(pages.into_iter().collect())
}

/// Write one image, plus its soft mask when it has alpha. Returns the
/// image's object id.
fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
    let size = format!("/Type /XObject /Subtype /Image /Width {} /Height {} /BitsPerComponent 8", image.width, image.height);
    match &image.data {
        ImageData::Jpeg { bytes, grayscale } => {
            let space = if *grayscale { "/DeviceGray" } else { "/DeviceRGB" };
            builder.push_stream(&format!("{} /ColorSpace {} /Filter /DCTDecode", size, space), bytes)
        }
        ImageData::Raster { rgb, alpha } => {
            let smask = alpha.as_ref().map(|alpha| {
                builder.push_stream(
                    &format!("{} /ColorSpace /DeviceGray /Filter /FlateDecode", size),
                    &compress_to_vec_zlib(alpha, 6),
                )
            });
            let smask_ref = smask.map(|id| format!(" /SMask {} 0 R", id)).unwrap_or_default();
            builder.push_stream(
                &format!("{} /ColorSpace /DeviceRGB /Filter /FlateDecode{}", size, smask_ref),
                &compress_to_vec_zlib(rgb, 6),
            )
        }
    }
}

fn serialize(builder: &PdfBuilder, catalog_id: usize, info_id: Option<usize>) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    let mut offsets = vec![0usize; builder.objects.len()];

    out.extend_from_slice(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n");
    for (id, data) in builder.objects.iter().enumerate().skip(1) {
        offsets[id] = out.len();
        let _ = writeln!(out, "{} 0 obj", id);
        out.extend_from_slice(data);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref = out.len();
    let _ = writeln!(out, "xref\n0 {}\n0000000000 65535 f ", builder.objects.len());
    for offset in &offsets[1..] {
        let _ = writeln!(out, "{:010} 00000 n ", offset);
    }
    let _ = write!(out, "trailer\n<< /Size {} /Root {} 0 R", builder.objects.len(), catalog_id);
    if let Some(id) = info_id {
        let _ = write!(out, " /Info {} 0 R", id);
    }
    let _ = writeln!(out, " >>\nstartxref\n{}\n%%EOF", xref);
    out
}
