//! Advance widths for the standard Helvetica faces, in 1/1000 em.
//!
//! Covers printable ASCII; other characters fall back to a few explicit
//! entries and then to the width of a digit.

/// Widths for U+0020..=U+007E, Helvetica.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Widths for U+0020..=U+007E, Helvetica-Bold.
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

/// Ascender and descender shared by both faces.
pub const ASCENT: f64 = 718.0;
pub const DESCENT: f64 = -207.0;

/// Glyph widths for one standard face.
#[derive(Debug, Clone, Copy)]
pub struct StandardFontMetrics {
    ascii: &'static [u16; 95],
}

pub(super) const HELVETICA: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_ASCII,
};

pub(super) const HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_BOLD_ASCII,
};

impl StandardFontMetrics {
    fn units(&self, ch: char) -> u16 {
        match ch {
            ' '..='~' => self.ascii[ch as usize - 0x20],
            '\u{2014}' | '\u{2026}' | '\u{2030}' => 1000,
            '\u{2013}' | '\u{20AC}' => 556,
            '\u{2022}' => 350,
            '\u{2018}' | '\u{2019}' | '\u{201A}' => 222,
            '\u{201C}' | '\u{201D}' | '\u{201E}' => 333,
            '\u{00A0}' => 278,
            _ => 556,
        }
    }

    /// Advance width of a character at `font_size`.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.units(ch) as f64 / 1000.0 * font_size
    }

    /// Width of a whole string at `font_size`.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}
