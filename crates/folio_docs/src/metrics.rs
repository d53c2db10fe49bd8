//! Glyph metrics for the built-in Helvetica faces.
//!
//! Widths are the standard Adobe AFM advance widths in 1/1000 em for the
//! printable ASCII range. Other characters are measured through their
//! transliterated base letter, which is what the fallback path draws anyway.

use crate::text::fold_char;

/// Millimetres per PDF point.
pub const PT_TO_MM: f64 = 25.4 / 72.0;

/// Line spacing factor applied to the font size.
pub const LINE_SPACING: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    Regular,
    Bold,
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
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
const HELVETICA_BOLD: [u16; 95] = [
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

/// Advance width of `c` in 1/1000 em.
pub fn char_width(face: FontFace, c: char) -> u16 {
    let table = match face {
        FontFace::Regular => &HELVETICA,
        FontFace::Bold => &HELVETICA_BOLD,
    };
    let lookup = |c: char| -> Option<u16> {
        let code = c as u32;
        (32..=126).contains(&code).then(|| table[(code - 32) as usize])
    };

    if let Some(w) = lookup(c) {
        return w;
    }
    match c {
        '\u{a0}' => table[0],
        '•' => 350,
        '–' => 556,
        '—' => 1000,
        '…' => 1000,
        '€' => 556,
        _ => lookup(fold_char(c)).unwrap_or(556),
    }
}

/// Rendered width of `text` in millimetres at `size_pt`.
pub fn text_width_mm(text: &str, face: FontFace, size_pt: f64) -> f64 {
    let units: u32 = text.chars().map(|c| char_width(face, c) as u32).sum();
    units as f64 / 1000.0 * size_pt * PT_TO_MM
}

/// Height of one text line in millimetres at `size_pt`.
pub fn line_height_mm(size_pt: f64) -> f64 {
    size_pt * PT_TO_MM * LINE_SPACING
}
