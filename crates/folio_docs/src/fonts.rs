//! Best-effort font asset loading and the glyph encoder that turns text into
//! something the active PDF font can draw.

use std::path::Path;

use folio_core::EncodingWarning;
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

use crate::text::normalize;

/// Drawn in place of characters no fallback can represent.
const REPLACEMENT: char = '?';

/// WinAnsi code points 0x80..=0x9F (undefined slots are `None`).
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('€'), None, Some('‚'), Some('ƒ'), Some('„'), Some('…'), Some('†'), Some('‡'),
    Some('ˆ'), Some('‰'), Some('Š'), Some('‹'), Some('Œ'), None, Some('Ž'), None,
    None, Some('‘'), Some('’'), Some('“'), Some('”'), Some('•'), Some('–'), Some('—'),
    Some('˜'), Some('™'), Some('š'), Some('›'), Some('œ'), None, Some('ž'), Some('Ÿ'),
];

/// Byte for `c` in WinAnsiEncoding, if it has one.
pub fn to_win_ansi(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .position(|slot| *slot == Some(c))
            .map(|i| 0x80 + i as u8),
    }
}

/// Character for a WinAnsi byte, if the slot is defined.
pub fn from_win_ansi(byte: u8) -> Option<char> {
    match byte {
        0x20..=0x7E | 0xA0..=0xFF => Some(byte as char),
        0x80..=0x9F => WIN_ANSI_HIGH[(byte - 0x80) as usize],
        _ => None,
    }
}

/// A TrueType font file to embed in generated documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAsset {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Read and sanity-check a TrueType font file.
pub fn load_font_asset(path: &Path) -> Result<FontAsset, EncodingWarning> {
    let asset = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| EncodingWarning::new(&asset, e.to_string()))?;

    if bytes.len() < 12 {
        return Err(EncodingWarning::new(asset, "file too small to be a font"));
    }
    match &bytes[..4] {
        [0x00, 0x01, 0x00, 0x00] | b"true" => {}
        b"OTTO" => {
            return Err(EncodingWarning::new(
                asset,
                "CFF-flavoured OpenType fonts cannot be embedded",
            ));
        }
        _ => return Err(EncodingWarning::new(asset, "not a TrueType font")),
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Embedded".into());
    let name: String = stem.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    Ok(FontAsset {
        name: if name.is_empty() { "Embedded".into() } else { name },
        bytes,
    })
}

/// How text reaches the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphMode {
    /// An embedded font is available: WinAnsi characters are kept as-is.
    Embedded,
    /// Built-in fonts only: every string is transliterated first.
    Transliterate,
}

/// The fonts resolved for one document plus any warnings met on the way.
#[derive(Debug, Clone)]
pub struct FontSet {
    pub regular: Option<FontAsset>,
    pub bold: Option<FontAsset>,
    pub warnings: Vec<EncodingWarning>,
}

impl FontSet {
    /// Built-in Helvetica faces only.
    pub fn builtin() -> Self {
        Self {
            regular: None,
            bold: None,
            warnings: Vec::new(),
        }
    }

    /// Load whichever assets are configured. Failures are logged and
    /// recorded, never returned.
    pub fn load(regular: Option<&Path>, bold: Option<&Path>) -> Self {
        let mut set = Self::builtin();
        let regular = regular.and_then(|p| set.try_load(p));
        let bold = bold.and_then(|p| set.try_load(p));
        set.regular = regular;
        set.bold = bold;
        set
    }

    fn try_load(&mut self, path: &Path) -> Option<FontAsset> {
        match load_font_asset(path) {
            Ok(asset) => {
                debug!(font = %asset.name, bytes = asset.bytes.len(), "Loaded font asset");
                Some(asset)
            }
            Err(warning) => {
                warn!("{warning}; falling back to transliterated glyphs");
                self.warnings.push(warning);
                None
            }
        }
    }

    pub fn mode(&self) -> GlyphMode {
        if self.regular.is_some() {
            GlyphMode::Embedded
        } else {
            GlyphMode::Transliterate
        }
    }

    pub fn encoder(&self) -> GlyphEncoder {
        GlyphEncoder { mode: self.mode() }
    }
}

/// Maps arbitrary text onto the characters the active font can draw.
#[derive(Debug, Clone, Copy)]
pub struct GlyphEncoder {
    mode: GlyphMode,
}

impl GlyphEncoder {
    pub fn new(mode: GlyphMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> GlyphMode {
        self.mode
    }

    /// Display-ready text: every character of the result is WinAnsi
    /// encodable or a `'\n'` line break.
    pub fn encode(&self, text: &str) -> String {
        match self.mode {
            GlyphMode::Transliterate => normalize(text).chars().filter_map(encodable_or_replacement).collect(),
            GlyphMode::Embedded => {
                let mut out = String::with_capacity(text.len());
                for c in text.nfc() {
                    if to_win_ansi(c).is_some() {
                        out.push(c);
                    } else {
                        out.extend(normalize(&c.to_string()).chars().filter_map(encodable_or_replacement));
                    }
                }
                out
            }
        }
    }
}

fn encodable_or_replacement(c: char) -> Option<char> {
    match c {
        '\r' => None,
        '\n' => Some('\n'),
        '\t' => Some(' '),
        c if to_win_ansi(c).is_some() => Some(c),
        _ => Some(REPLACEMENT),
    }
}
