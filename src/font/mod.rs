//! # Font Metrics
//!
//! The native PDF backend draws with the standard Helvetica faces, which
//! every PDF viewer ships, so nothing is embedded. Layout still needs their
//! widths to align text and to cut single-line text down to its box.

pub mod metrics;

use std::borrow::Cow;

pub use metrics::StandardFontMetrics;

const ELLIPSIS: char = '\u{2026}';

/// The standard PDF fonts this crate draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    pub fn for_weight(bold: bool) -> Self {
        if bold {
            Self::HelveticaBold
        } else {
            Self::Helvetica
        }
    }

    /// The PDF base font name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Resource name used inside content streams.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "F0",
            Self::HelveticaBold => "F1",
        }
    }

    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            Self::Helvetica => metrics::HELVETICA,
            Self::HelveticaBold => metrics::HELVETICA_BOLD,
        }
    }

    pub fn measure(&self, text: &str, font_size: f64) -> f64 {
        self.metrics().measure_string(text, font_size)
    }

    /// Distance from a line's vertical centre down to its baseline.
    pub fn baseline_offset(&self, font_size: f64) -> f64 {
        (metrics::ASCENT + metrics::DESCENT) / 2000.0 * font_size
    }

    /// Shorten `text` so it fits in `max_width`, ending in an ellipsis.
    ///
    /// Text that already fits is returned unchanged. When not even the
    /// ellipsis fits, the result is empty.
    pub fn truncate<'t>(&self, text: &'t str, font_size: f64, max_width: f64) -> Cow<'t, str> {
        let metrics = self.metrics();
        if metrics.measure_string(text, font_size) <= max_width {
            return Cow::Borrowed(text);
        }

        let budget = max_width - metrics.char_width(ELLIPSIS, font_size);
        if budget < 0.0 {
            return Cow::Borrowed("");
        }

        let mut width = 0.0;
        let mut end = 0;
        for (idx, ch) in text.char_indices() {
            let w = metrics.char_width(ch, font_size);
            if width + w > budget {
                break;
            }
            width += w;
            end = idx + ch.len_utf8();
        }

        let mut out = text[..end].trim_end().to_string();
        out.push(ELLIPSIS);
        Cow::Owned(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helvetica_space_width() {
        let w = StandardFont::Helvetica.metrics().char_width(' ', 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_bold_is_wider() {
        let regular = StandardFont::Helvetica.measure("Invoice", 12.0);
        let bold = StandardFont::HelveticaBold.measure("Invoice", 12.0);
        assert!(bold > regular);
    }

    #[test]
    fn test_em_dash_is_one_em() {
        let w = StandardFont::Helvetica.measure("\u{2014}", 10.0);
        assert!((w - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_truncate_keeps_fitting_text() {
        let font = StandardFont::Helvetica;
        assert!(matches!(font.truncate("Total", 12.0, 200.0), Cow::Borrowed("Total")));
    }

    #[test]
    fn test_truncate_adds_ellipsis_within_width() {
        let font = StandardFont::Helvetica;
        let text = "Payment due within 30 days. Thank you for your business!";
        let cut = font.truncate(text, 12.0, 100.0);
        assert!(cut.ends_with('\u{2026}'));
        assert!(cut.len() < text.len());
        assert!(font.measure(&cut, 12.0) <= 100.0);
    }

    #[test]
    fn test_truncate_to_nothing() {
        assert_eq!(StandardFont::Helvetica.truncate("Hello", 12.0, 2.0), "");
    }
}
