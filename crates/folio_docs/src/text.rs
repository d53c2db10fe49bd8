//! Text normalization, markup flattening and word wrapping.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::metrics::{FontFace, text_width_mm};

/// Letters folded to a single ASCII letter after NFD stripping.
///
/// Most entries are already covered by decomposition; the dotless `ı` has no
/// decomposition and only this table catches it.
const FALLBACK_TABLE: [(char, char); 18] = [
    ('ı', 'i'),
    ('İ', 'I'),
    ('ğ', 'g'),
    ('Ğ', 'G'),
    ('ü', 'u'),
    ('Ü', 'U'),
    ('ş', 's'),
    ('Ş', 'S'),
    ('ö', 'o'),
    ('Ö', 'O'),
    ('ç', 'c'),
    ('Ç', 'C'),
    ('â', 'a'),
    ('Â', 'A'),
    ('î', 'i'),
    ('Î', 'I'),
    ('û', 'u'),
    ('Û', 'U'),
];

const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "pre",
    "section",
    "article",
    "header",
    "footer",
    "table",
    "tr",
    "ul",
    "ol",
];

fn table_lookup(c: char) -> char {
    FALLBACK_TABLE
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
        .unwrap_or(c)
}

/// Fold a single character to its transliterated base letter.
///
/// Characters that decompose into several non-mark characters keep their
/// first one; this is only used for measurement and glyph fallback.
pub fn fold_char(c: char) -> char {
    let base = c
        .to_string()
        .nfd()
        .find(|ch| !is_combining_mark(*ch))
        .unwrap_or(c);
    table_lookup(base)
}

/// Transliterate `text` to plain letters: NFD, strip combining marks, then
/// apply the fallback table.
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(table_lookup)
        .collect()
}

// ---------------------------------------------------------------------------
// Markup → flow text
// ---------------------------------------------------------------------------

struct Tag {
    name: String,
    closing: bool,
}

fn parse_tag(raw: &str) -> Option<Tag> {
    let raw = raw.trim();
    let (closing, rest) = match raw.strip_prefix('/') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, raw),
    };
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }
    Some(Tag { name, closing })
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = entity.strip_prefix('#')?;
            let hex = num.strip_prefix('x').or_else(|| num.strip_prefix('X'));
            let code = match hex {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn push_text(out: &mut String, text: &str) {
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        push_collapsed(out, &rest[..amp]);
        let after = &rest[amp + 1..];
        match after.find(';') {
            Some(semi) if semi <= 10 => match decode_entity(&after[..semi]) {
                Some(c) => {
                    out.push(c);
                    rest = &after[semi + 1..];
                }
                None => {
                    out.push('&');
                    rest = after;
                }
            },
            _ => {
                out.push('&');
                rest = after;
            }
        }
    }
    push_collapsed(out, rest);
}

/// Source whitespace is not layout: runs collapse to one space.
fn push_collapsed(out: &mut String, text: &str) {
    for c in text.chars() {
        if c.is_whitespace() {
            if !out.ends_with(' ') && !out.ends_with('\n') && !out.is_empty() {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(c);
            }
        } else {
            newlines = 0;
            out.push(c);
        }
    }
    out
}

/// Convert rich/markup text to plain flow text.
///
/// `<br>` becomes a newline, block elements and list items end with a
/// newline, list items start with `"• "`. Unknown tags are dropped and their
/// text kept. Three or more consecutive newlines collapse to two and the
/// result is trimmed.
pub fn html_to_flow_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(lt) = rest.find('<') {
        push_text(&mut out, &rest[..lt]);
        let after = &rest[lt..];

        if let Some(comment) = after.strip_prefix("<!--") {
            rest = match comment.find("-->") {
                Some(end) => &comment[end + 3..],
                None => "",
            };
            continue;
        }

        let Some(gt) = after.find('>') else {
            push_text(&mut out, after);
            rest = "";
            break;
        };

        if let Some(tag) = parse_tag(&after[1..gt]) {
            match (tag.name.as_str(), tag.closing) {
                ("br", _) => out.push('\n'),
                ("li", false) => out.push_str("• "),
                ("li", true) => out.push('\n'),
                (name, true) if BLOCK_TAGS.contains(&name) => out.push('\n'),
                _ => {}
            }
        }
        rest = &after[gt + 1..];
    }
    push_text(&mut out, rest);

    let trimmed_lines: Vec<&str> = out.split('\n').map(str::trim).collect();
    collapse_blank_lines(&trimmed_lines.join("\n"))
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Word wrap
// ---------------------------------------------------------------------------

/// Greedy word wrap to `max_width_mm`.
///
/// Explicit newlines are kept (a blank paragraph yields an empty line); a
/// word wider than the line is broken between characters.
pub fn wrap_text(text: &str, max_width_mm: f64, face: FontFace, size_pt: f64) -> Vec<String> {
    let fits = |s: &str| text_width_mm(s, face, size_pt) <= max_width_mm;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut produced = false;

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                produced = true;
            }
            if fits(word) {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if !fits(&current) && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        produced = true;
                        current.push(c);
                    }
                }
            }
        }

        if !current.is_empty() || !produced {
            lines.push(current);
        }
    }
    lines
}
