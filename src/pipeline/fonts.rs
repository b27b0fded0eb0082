//! Metrics and encoding for the two standard PDF fonts the renderer uses.
//!
//! Helvetica and Helvetica-Bold are among the 14 standard fonts every PDF
//! reader ships, so nothing is embedded. Line breaking and justification need
//! glyph advance widths; the tables below are the AFM widths (1/1000 em) for
//! printable ASCII. Text is written in WinAnsiEncoding, one byte per glyph.

/// Line height as a multiple of the font size (ascender − descender + gap).
pub const LINE_HEIGHT_FACTOR: f32 = 1.156;

/// Ascender height as a multiple of the font size.
pub const ASCENT_FACTOR: f32 = 0.718;

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,                               // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015,                                             // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,                // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,                // 'N'..'Z'
    278, 278, 278, 469, 556, 333,                                                   // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,                // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,                // 'n'..'z'
    334, 260, 334, 584,                                                             // '{'..'~'
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    pub const ALL: [Font; 2] = [Font::Regular, Font::Bold];

    pub fn base_name(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
        }
    }

    /// Name under which the font is registered in page resources.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    /// Advance width of `ch` in 1/1000 em.
    pub fn char_width(self, ch: char) -> u16 {
        let table = match self {
            Font::Regular => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        match ch {
            ' '..='~' => table[ch as usize - 0x20],
            '\u{a0}' => 278,
            '•' => 350,
            '–' => 556,
            '—' | '…' | '‰' => 1000,
            '‘' | '’' | '‚' => if self == Font::Bold { 278 } else { 222 },
            '“' | '”' | '„' => if self == Font::Bold { 500 } else { 333 },
            _ => if self == Font::Bold { 611 } else { 556 },
        }
    }

    /// Width of `text` in points at `size`.
    pub fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|c| self.char_width(printable(c)) as u32)
            .sum();
        units as f32 * size / 1000.0
    }

    pub fn line_height(size: f32) -> f32 {
        size * LINE_HEIGHT_FACTOR
    }

    pub fn ascent(size: f32) -> f32 {
        size * ASCENT_FACTOR
    }
}

/// The glyph actually drawn for `ch`: characters WinAnsi cannot encode are
/// drawn as `?`.
fn printable(ch: char) -> char {
    if win_ansi_byte(ch).is_some() {
        ch
    } else {
        '?'
    }
}

/// WinAnsiEncoding byte for `ch`, if it has one.
pub fn win_ansi_byte(ch: char) -> Option<u8> {
    let b = match ch {
        ' '..='~' => ch as u8,
        '\u{a0}'..='\u{ff}' => ch as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        _ => return None,
    };
    Some(b)
}

/// Encode `text` as a PDF literal string body (without the parentheses).
///
/// Delimiters are escaped and every byte outside printable ASCII is written
/// as an octal escape, keeping content streams 7-bit clean.
pub fn pdf_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        let b = win_ansi_byte(ch).unwrap_or(b'?');
        match b {
            b'(' | b')' | b'\\' => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\{:03o}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_widths_come_from_the_tables() {
        assert_eq!(Font::Regular.char_width(' '), 278);
        assert_eq!(Font::Regular.char_width('W'), 944);
        assert_eq!(Font::Regular.char_width('i'), 222);
        assert_eq!(Font::Bold.char_width('i'), 278);
        assert_eq!(Font::Regular.char_width('~'), 584);
    }

    #[test]
    fn text_width_scales_with_size() {
        let w12 = Font::Regular.text_width("Hello", 12.0);
        let w24 = Font::Regular.text_width("Hello", 24.0);
        assert!((w24 - 2.0 * w12).abs() < 0.001);
        // H e l l o = 722 + 556 + 222 + 222 + 556
        assert!((w12 - 2278.0 * 12.0 / 1000.0).abs() < 0.001);
    }

    #[test]
    fn bold_is_wider() {
        assert!(Font::Bold.text_width("heading", 12.0) > Font::Regular.text_width("heading", 12.0));
    }

    #[test]
    fn literal_escapes_delimiters_and_non_ascii() {
        assert_eq!(pdf_literal("a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(pdf_literal("• item"), "\\225 item");
        assert_eq!(pdf_literal("café"), "caf\\351");
        assert_eq!(pdf_literal("日本"), "??");
    }

    #[test]
    fn unencodable_chars_measure_as_question_marks() {
        assert_eq!(
            Font::Regular.text_width("日", 10.0),
            Font::Regular.text_width("?", 10.0)
        );
    }
}
