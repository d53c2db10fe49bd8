//! PDF document serialization.
//!
//! Pages are laid out as display lists of draw operations in millimetres
//! (origin top-left) and serialized into a PDF 1.4 file by hand. Text uses
//! the built-in Helvetica faces unless a TrueType asset was loaded, in which
//! case it is embedded with WinAnsi encoding.

use crate::fonts::{FontAsset, FontSet, from_win_ansi, to_win_ansi};
use crate::metrics::{FontFace, PT_TO_MM, char_width};
use crate::request::Rgb;
use crate::text::normalize;

const MM_TO_PT: f64 = 1.0 / PT_TO_MM;

/// One drawing instruction on a page. Coordinates are millimetres from the
/// top-left corner; text `y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f64,
        y: f64,
        text: String,
        face: FontFace,
        size: f64,
        color: Rgb,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Rgb,
    },
}

/// A laid-out page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// Every text run on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Rect { .. } => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t == needle)
    }

    /// Baseline of the first run equal to `needle`.
    pub fn text_position(&self, needle: &str) -> Option<(f64, f64)> {
        self.ops.iter().find_map(|op| match op {
            DrawOp::Text { x, y, text, .. } if text == needle => Some((*x, *y)),
            _ => None,
        })
    }

    pub fn fills(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Rect { fill, .. } => Some(*fill),
            DrawOp::Text { .. } => None,
        })
    }
}

/// Escape special characters for PDF string literals.
fn pdf_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Encode `text` as a WinAnsi PDF string literal, parentheses included.
fn pdf_string(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.push(b'(');
    for c in text.chars() {
        let byte = to_win_ansi(c).unwrap_or(b'?');
        match byte {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(byte);
            }
            0x20..=0x7E => out.push(byte),
            _ => out.extend_from_slice(format!("\\{byte:03o}").as_bytes()),
        }
    }
    out.push(b')');
    out
}

fn font_resource(face: FontFace) -> &'static str {
    match face {
        FontFace::Bold => "F1",
        FontFace::Regular => "F2",
    }
}

/// Content stream for one page.
fn render_content(page: &Page) -> Vec<u8> {
    let mut content = Vec::new();
    for op in &page.ops {
        match op {
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                fill,
            } => {
                let (r, g, b) = fill.unit();
                content.extend_from_slice(
                    format!(
                        "{r:.3} {g:.3} {b:.3} rg\n{:.2} {:.2} {:.2} {:.2} re f\n",
                        x * MM_TO_PT,
                        (page.height - y - height) * MM_TO_PT,
                        width * MM_TO_PT,
                        height * MM_TO_PT,
                    )
                    .as_bytes(),
                );
            }
            DrawOp::Text {
                x,
                y,
                text,
                face,
                size,
                color,
            } => {
                let (r, g, b) = color.unit();
                content.extend_from_slice(
                    format!(
                        "BT\n/{} {size:.1} Tf\n{r:.3} {g:.3} {b:.3} rg\n{:.2} {:.2} Td\n",
                        font_resource(*face),
                        x * MM_TO_PT,
                        (page.height - y) * MM_TO_PT,
                    )
                    .as_bytes(),
                );
                content.extend_from_slice(&pdf_string(text));
                content.extend_from_slice(b" Tj\nET\n");
            }
        }
    }
    content
}

/// Writes numbered objects and remembers their byte offsets.
struct ObjectWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl ObjectWriter {
    fn new() -> Self {
        Self {
            buf: b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec(),
            offsets: Vec::new(),
        }
    }

    /// Objects must be written in id order starting at 1.
    fn object(&mut self, body: &str) {
        self.offsets.push(self.buf.len());
        let id = self.offsets.len();
        self.buf
            .extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
    }

    fn stream(&mut self, dict: &str, data: &[u8]) {
        self.offsets.push(self.buf.len());
        let id = self.offsets.len();
        self.buf
            .extend_from_slice(format!("{id} 0 obj\n<< {dict} >>\nstream\n").as_bytes());
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self, root: usize, info: usize) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let num_objects = self.offsets.len() + 1;
        let mut tail = format!("xref\n0 {num_objects}\n0000000000 65535 f \n");
        for offset in &self.offsets {
            tail.push_str(&format!("{offset:010} 00000 n \n"));
        }
        tail.push_str(&format!(
            "trailer\n<< /Size {num_objects} /Root {root} 0 R /Info {info} 0 R >>\n"
        ));
        tail.push_str(&format!("startxref\n{xref_offset}\n%%EOF\n"));
        self.buf.extend_from_slice(tail.as_bytes());
        self.buf
    }
}

fn builtin_font(base: &str) -> String {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>")
}

/// Advances come from the Helvetica metrics that layout measures with, not
/// from the face's own `hmtx` table: text stays inside the box it was
/// wrapped to, spaced like Helvetica.
fn embedded_font(asset: &FontAsset, face: FontFace, descriptor_id: usize) -> String {
    let widths: Vec<String> = (32u8..=255)
        .map(|b| char_width(face, from_win_ansi(b).unwrap_or(' ')).to_string())
        .collect();
    format!(
        "<< /Type /Font /Subtype /TrueType /BaseFont /{} /FirstChar 32 /LastChar 255 \
         /Widths [{}] /Encoding /WinAnsiEncoding /FontDescriptor {descriptor_id} 0 R >>",
        asset.name,
        widths.join(" ")
    )
}

fn font_descriptor(asset: &FontAsset, file_id: usize) -> String {
    format!(
        "<< /Type /FontDescriptor /FontName /{} /Flags 32 /FontBBox [-600 -300 1600 1000] \
         /ItalicAngle 0 /Ascent 900 /Descent -250 /CapHeight 700 /StemV 80 \
         /FontFile2 {file_id} 0 R >>",
        asset.name
    )
}

/// Serializes laid-out pages into a PDF file.
pub struct PdfBuilder<'a> {
    fonts: &'a FontSet,
    pages: Vec<(f64, f64, Vec<u8>)>,
}

impl<'a> PdfBuilder<'a> {
    pub fn new(fonts: &'a FontSet) -> Self {
        Self {
            fonts,
            pages: Vec::new(),
        }
    }

    pub fn add_page(&mut self, page: &Page) {
        self.pages
            .push((page.width * MM_TO_PT, page.height * MM_TO_PT, render_content(page)));
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Build the complete PDF file as bytes.
    pub fn build(&self, title: &str) -> Vec<u8> {
        // Fixed objects: 1 catalog, 2 page tree, 3 bold font, 4 regular font, 5 info.
        let embedded: Vec<(FontFace, &FontAsset)> = [
            (FontFace::Bold, self.fonts.bold.as_ref()),
            (FontFace::Regular, self.fonts.regular.as_ref()),
        ]
        .into_iter()
        .filter_map(|(face, asset)| asset.map(|a| (face, a)))
        .collect();
        let first_font_obj = 6;
        let first_page_obj = first_font_obj + embedded.len() * 2;
        let page_ids: Vec<usize> = (0..self.pages.len())
            .map(|i| first_page_obj + i * 2)
            .collect();
        let descriptor_for = |face: FontFace| {
            embedded
                .iter()
                .position(|(f, _)| *f == face)
                .map(|i| first_font_obj + i * 2)
        };

        let mut w = ObjectWriter::new();
        w.object("<< /Type /Catalog /Pages 2 0 R >>");

        let kids: Vec<String> = page_ids.iter().map(|id| format!("{id} 0 R")).collect();
        w.object(&format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_ids.len()
        ));

        for (face, base) in [(FontFace::Bold, "Helvetica-Bold"), (FontFace::Regular, "Helvetica")] {
            match (descriptor_for(face), embedded.iter().find(|(f, _)| *f == face)) {
                (Some(descriptor_id), Some((_, asset))) => {
                    w.object(&embedded_font(asset, face, descriptor_id))
                }
                _ => w.object(&builtin_font(base)),
            }
        }

        w.object(&format!(
            "<< /Title ({}) /Producer (Folio) >>",
            pdf_escape(&normalize(title))
        ));

        for (i, (_, asset)) in embedded.iter().enumerate() {
            let file_id = first_font_obj + i * 2 + 1;
            w.object(&font_descriptor(asset, file_id));
            w.stream(
                &format!(
                    "/Length {} /Length1 {}",
                    asset.bytes.len(),
                    asset.bytes.len()
                ),
                &asset.bytes,
            );
        }

        for (i, (width, height, content)) in self.pages.iter().enumerate() {
            let content_id = page_ids[i] + 1;
            w.object(&format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {width:.2} {height:.2}] \
                 /Contents {content_id} 0 R /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> >>"
            ));
            w.stream(&format!("/Length {}", content.len()), content);
        }

        w.finish(1, 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> Page {
        let mut page = Page::new(210.0, 297.0);
        page.ops.push(DrawOp::Rect {
            x: 14.0,
            y: 30.0,
            width: 182.0,
            height: 7.0,
            fill: Rgb(41, 128, 185),
        });
        page.ops.push(DrawOp::Text {
            x: 15.5,
            y: 35.0,
            text: "Price (sale) \\ 100".into(),
            face: FontFace::Regular,
            size: 9.0,
            color: Rgb::BLACK,
        });
        page
    }

    #[test]
    fn test_build_single_page() {
        let fonts = FontSet::builtin();
        let mut builder = PdfBuilder::new(&fonts);
        builder.add_page(&sample_page());
        let bytes = builder.build("Test Report");

        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        let content = String::from_utf8_lossy(&bytes);
        assert!(content.contains("/Count 1"));
        assert!(content.contains("/BaseFont /Helvetica-Bold"));
        assert!(content.contains("/Title (Test Report)"));
        assert!(content.contains("\\(sale\\)"));
        assert!(content.contains("\\\\ 100"));
    }

    #[test]
    fn test_build_multiple_pages() {
        let fonts = FontSet::builtin();
        let mut builder = PdfBuilder::new(&fonts);
        for _ in 0..3 {
            builder.add_page(&sample_page());
        }
        assert_eq!(builder.page_count(), 3);
        let bytes = builder.build("Three");
        let content = String::from_utf8_lossy(&bytes);
        assert!(content.contains("/Count 3"));
        assert_eq!(content.matches("/Type /Page ").count(), 3);
    }

    #[test]
    fn test_build_zero_pages_is_still_valid() {
        let fonts = FontSet::builtin();
        let bytes = PdfBuilder::new(&fonts).build("Empty");
        let content = String::from_utf8_lossy(&bytes);
        assert!(content.contains("/Count 0"));
        assert!(content.contains("startxref"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let fonts = FontSet::builtin();
        let mut builder = PdfBuilder::new(&fonts);
        builder.add_page(&sample_page());
        let bytes = builder.build("Offsets");
        let text = String::from_utf8_lossy(&bytes).to_string();

        let xref_start = text.find("xref\n").unwrap();
        let entries: Vec<usize> = text[xref_start..]
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect();
        assert_eq!(entries.len(), 7);
        for (i, offset) in entries.iter().enumerate() {
            let expected = format!("{} 0 obj", i + 1);
            assert!(
                bytes[*offset..].starts_with(expected.as_bytes()),
                "object {} not at offset {offset}",
                i + 1
            );
        }
    }

    #[test]
    fn test_embedded_font_objects() {
        let fonts = FontSet {
            regular: Some(FontAsset {
                name: "DejaVuSans".into(),
                bytes: vec![0, 1, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8],
            }),
            bold: None,
            warnings: Vec::new(),
        };
        let mut builder = PdfBuilder::new(&fonts);
        builder.add_page(&sample_page());
        let content = String::from_utf8_lossy(&builder.build("Embedded")).to_string();
        assert!(content.contains("/Subtype /TrueType /BaseFont /DejaVuSans"));
        assert!(content.contains("/FontFile2 7 0 R"));
        assert!(content.contains("/Length 12 /Length1 12"));
        assert!(content.contains("/BaseFont /Helvetica-Bold"));
    }

    #[test]
    fn test_embedded_widths_match_layout_metrics() {
        let asset = FontAsset {
            name: "DejaVuSans".into(),
            bytes: vec![0, 1, 0, 0],
        };
        let dict = embedded_font(&asset, FontFace::Regular, 9);
        let start = dict.find("/Widths [").unwrap() + "/Widths [".len();
        let end = start + dict[start..].find(']').unwrap();
        let widths: Vec<u16> = dict[start..end]
            .split_whitespace()
            .map(|w| w.parse().unwrap())
            .collect();

        assert_eq!(widths.len(), 224);
        for c in [' ', 'A', 'i', 'W', 'ü', 'Ç'] {
            let code = to_win_ansi(c).unwrap();
            assert_eq!(widths[(code - 32) as usize], char_width(FontFace::Regular, c), "{c}");
        }
    }

    #[test]
    fn test_pdf_string_encodes_win_ansi() {
        assert_eq!(pdf_string("abc"), b"(abc)".to_vec());
        assert_eq!(pdf_string("ü"), b"(\\374)".to_vec());
        assert_eq!(pdf_string("•"), b"(\\225)".to_vec());
        assert_eq!(pdf_string("ş"), b"(?)".to_vec());
    }

    #[test]
    fn test_pdf_escape() {
        assert_eq!(pdf_escape("hello"), "hello");
        assert_eq!(pdf_escape("(test)"), "\\(test\\)");
        assert_eq!(pdf_escape("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_page_queries() {
        let page = sample_page();
        assert!(page.contains_text("Price (sale) \\ 100"));
        assert_eq!(page.text_position("Price (sale) \\ 100"), Some((15.5, 35.0)));
        assert_eq!(page.fills().collect::<Vec<_>>(), vec![Rgb(41, 128, 185)]);
    }
}
