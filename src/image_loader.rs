//! # Image Sources
//!
//! Image elements carry a free-form `src` string. The PDF writer needs the
//! actual pixels, so this module classifies the source, reads its bytes and
//! turns them into something a PDF image XObject can hold. JPEG bytes are
//! embedded as-is under DCTDecode; PNG is decoded to RGB with a separate
//! alpha plane for the soft mask.
//!
//! Remote URLs are recognised but never fetched. The markup writer can hand
//! them to a browser; the PDF writer draws a placeholder instead. File paths
//! are only read when the caller's [`FileAccess`] allows it.

use std::io::Cursor;
use std::path::PathBuf;

use base64::Engine;

use crate::error::PlatenError;

/// Where an image `src` points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// `data:image/...;base64,<payload>`; holds the payload.
    DataUri(&'a str),
    /// `http://` or `https://`.
    Remote(&'a str),
    /// An explicit file path (`/`, `./` or `../`).
    Path(&'a str),
    /// Anything else is tried as raw base64.
    Base64(&'a str),
}

impl<'a> ImageSource<'a> {
    pub fn classify(src: &'a str) -> Result<Self, PlatenError> {
        let src = src.trim();
        if src.starts_with("data:") {
            let (_, payload) = src
                .split_once(',')
                .ok_or_else(|| PlatenError::Image("data URI has no payload".to_string()))?;
            return Ok(Self::DataUri(payload));
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return Ok(Self::Remote(src));
        }
        // Base64 text contains '/', so only explicit prefixes mean a path.
        if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
            return Ok(Self::Path(src));
        }
        Ok(Self::Base64(src))
    }
}

/// Which file paths an image `src` may read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FileAccess {
    /// No file is read; only inline data loads.
    #[default]
    Denied,
    /// Any path the process can read.
    Unrestricted,
    /// Paths that resolve inside this directory. Relative paths are joined
    /// onto it.
    Within(PathBuf),
}

/// A decoded image ready for embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub data: ImageData,
}

impl LoadedImage {
    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

#[derive(Debug, Clone)]
pub enum ImageData {
    /// Untouched JPEG bytes.
    Jpeg { bytes: Vec<u8>, grayscale: bool },
    /// 8-bit RGB samples plus an alpha plane when any pixel is translucent.
    Raster { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// Read and decode the image behind `src`.
pub fn load_image(src: &str, access: &FileAccess) -> Result<LoadedImage, PlatenError> {
    let bytes = match ImageSource::classify(src)? {
        ImageSource::DataUri(payload) | ImageSource::Base64(payload) => decode_base64(payload)?,
        ImageSource::Remote(url) => {
            return Err(PlatenError::Image(format!("remote images are not fetched: {}", url)));
        }
        ImageSource::Path(path) => read_path(path, access)?,
    };
    decode_bytes(&bytes)
}

#[cfg(not(target_arch = "wasm32"))]
fn read_path(path: &str, access: &FileAccess) -> Result<Vec<u8>, PlatenError> {
    let resolved = match access {
        FileAccess::Denied => {
            return Err(PlatenError::Image(format!("file images are disabled: '{}'", path)));
        }
        FileAccess::Unrestricted => PathBuf::from(path),
        FileAccess::Within(base) => confine(base, path)?,
    };
    std::fs::read(&resolved).map_err(|e| PlatenError::Image(format!("cannot read '{}': {}", path, e)))
}

/// Canonicalize `path` against `base` and require it to stay inside.
#[cfg(not(target_arch = "wasm32"))]
fn confine(base: &std::path::Path, path: &str) -> Result<PathBuf, PlatenError> {
    let unreadable = |e: std::io::Error| PlatenError::Image(format!("cannot read '{}': {}", path, e));
    let base = base.canonicalize().map_err(unreadable)?;
    let resolved = base.join(path).canonicalize().map_err(unreadable)?;
    if !resolved.starts_with(&base) {
        return Err(PlatenError::Image(format!(
            "'{}' is outside the image directory",
            path
        )));
    }
    Ok(resolved)
}

#[cfg(target_arch = "wasm32")]
fn read_path(path: &str, _access: &FileAccess) -> Result<Vec<u8>, PlatenError> {
    Err(PlatenError::Image(format!(
        "file paths are unavailable in WASM: '{}'",
        path
    )))
}

fn decode_base64(payload: &str) -> Result<Vec<u8>, PlatenError> {
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| PlatenError::Image(format!("invalid base64: {}", e)))
}

fn decode_bytes(bytes: &[u8]) -> Result<LoadedImage, PlatenError> {
    if bytes.starts_with(&[0xFF, 0xD8]) {
        decode_jpeg(bytes)
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        decode_png(bytes)
    } else {
        Err(PlatenError::Image("unsupported format, expected JPEG or PNG".to_string()))
    }
}

fn decode_jpeg(bytes: &[u8]) -> Result<LoadedImage, PlatenError> {
    let (width, height) = image::io::Reader::with_format(Cursor::new(bytes), image::ImageFormat::Jpeg)
        .into_dimensions()
        .map_err(|e| PlatenError::Image(format!("bad JPEG: {}", e)))?;

    Ok(LoadedImage {
        width,
        height,
        data: ImageData::Jpeg {
            bytes: bytes.to_vec(),
            grayscale: jpeg_components(bytes) == Some(1),
        },
    })
}

/// Component count from the first start-of-frame segment.
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    let mut i = 2;
    while i + 3 < bytes.len() && bytes[i] == 0xFF {
        let marker = bytes[i + 1];
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) {
            return bytes.get(i + 9).copied();
        }
        let len = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
        i += 2 + len;
    }
    None
}

fn decode_png(bytes: &[u8]) -> Result<LoadedImage, PlatenError> {
    let decoded = image::io::Reader::with_format(Cursor::new(bytes), image::ImageFormat::Png)
        .decode()
        .map_err(|e| PlatenError::Image(format!("bad PNG: {}", e)))?
        .to_rgba8();

    let (width, height) = decoded.dimensions();
    let pixels = (width as usize) * (height as usize);
    let mut rgb = Vec::with_capacity(pixels * 3);
    let mut alpha = Vec::with_capacity(pixels);

    for px in decoded.pixels() {
        rgb.extend_from_slice(&px.0[..3]);
        alpha.push(px.0[3]);
    }
    let translucent = alpha.iter().any(|&a| a != 255);

    Ok(LoadedImage {
        width,
        height,
        data: ImageData::Raster {
            rgb,
            alpha: translucent.then_some(alpha),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(pixel: [u8; 4]) -> Vec<u8> {
        let mut img = image::RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba(pixel));
        img.put_pixel(1, 0, image::Rgba(pixel));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 2, 1, image::ColorType::Rgba8).unwrap();
        buf
    }

    #[test]
    fn test_classify_sources() {
        assert_eq!(
            ImageSource::classify("data:image/png;base64,AAAA").unwrap(),
            ImageSource::DataUri("AAAA")
        );
        assert!(matches!(
            ImageSource::classify("https://cdn.example.com/logo.png").unwrap(),
            ImageSource::Remote(_)
        ));
        assert!(matches!(ImageSource::classify("./logo.png").unwrap(), ImageSource::Path(_)));
        assert!(matches!(ImageSource::classify("iVBORw0KGgo=").unwrap(), ImageSource::Base64(_)));
        assert!(ImageSource::classify("data:image/png;base64").is_err());
    }

    #[test]
    fn test_remote_is_not_fetched() {
        let err = load_image("https://example.com/a.png", &FileAccess::Unrestricted).unwrap_err();
        assert!(err.to_string().contains("not fetched"));
    }

    #[test]
    fn test_unsupported_bytes() {
        assert!(decode_bytes(&[0, 1, 2, 3, 4]).is_err());
    }

    #[test]
    fn test_opaque_png_has_no_alpha() {
        let loaded = decode_bytes(&png_bytes([10, 20, 30, 255])).unwrap();
        assert_eq!((loaded.width, loaded.height), (2, 1));
        assert_eq!(loaded.aspect_ratio(), 2.0);
        match loaded.data {
            ImageData::Raster { rgb, alpha } => {
                assert_eq!(rgb, vec![10, 20, 30, 10, 20, 30]);
                assert!(alpha.is_none());
            }
            other => panic!("expected raster, got {:?}", other),
        }
    }

    #[test]
    fn test_translucent_png_keeps_alpha() {
        let loaded = decode_bytes(&png_bytes([255, 0, 0, 128])).unwrap();
        match loaded.data {
            ImageData::Raster { alpha, .. } => assert_eq!(alpha, Some(vec![128, 128])),
            other => panic!("expected raster, got {:?}", other),
        }
    }

    #[test]
    fn test_jpeg_passthrough() {
        let img = image::RgbImage::from_fn(4, 2, |_, _| image::Rgb([0, 128, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 4, 2, image::ColorType::Rgb8).unwrap();

        let loaded = decode_bytes(&buf).unwrap();
        assert_eq!((loaded.width, loaded.height), (4, 2));
        match loaded.data {
            ImageData::Jpeg { bytes, grayscale } => {
                assert_eq!(bytes, buf);
                assert!(!grayscale);
            }
            other => panic!("expected jpeg, got {:?}", other),
        }
    }

    #[test]
    fn test_data_uri_round_trip() {
        let b64 = base64::engine::general_purpose::STANDARD.encode(png_bytes([0, 255, 0, 255]));
        let loaded = load_image(&format!("data:image/png;base64,{}", b64), &FileAccess::Denied).unwrap();
        assert_eq!(loaded.width, 2);
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("platen-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_file_paths_denied_by_default() {
        let dir = scratch_dir("denied");
        let file = dir.join("logo.png");
        std::fs::write(&file, png_bytes([0, 0, 0, 255])).unwrap();

        let src = file.to_string_lossy().to_string();
        let err = load_image(&src, &FileAccess::default()).unwrap_err();
        assert!(err.to_string().contains("disabled"));
        assert_eq!(load_image(&src, &FileAccess::Unrestricted).unwrap().width, 2);
    }

    #[test]
    fn test_file_paths_confined_to_directory() {
        let root = scratch_dir("confined");
        let assets = root.join("assets");
        std::fs::create_dir_all(&assets).unwrap();
        std::fs::write(assets.join("logo.png"), png_bytes([0, 0, 0, 255])).unwrap();
        std::fs::write(root.join("secret.png"), png_bytes([0, 0, 0, 255])).unwrap();

        let access = FileAccess::Within(assets.clone());
        assert_eq!(load_image("./logo.png", &access).unwrap().height, 1);
        let absolute = assets.join("logo.png").to_string_lossy().to_string();
        assert!(load_image(&absolute, &access).is_ok());

        let err = load_image("../secret.png", &access).unwrap_err();
        assert!(err.to_string().contains("outside"));
        let outside = root.join("secret.png").to_string_lossy().to_string();
        assert!(load_image(&outside, &access).is_err());
    }
}
