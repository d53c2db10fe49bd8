//! The document paginator: a cursor that walks down the page, starts new
//! pages when content would cross the bottom margin, and finally stamps
//! footers and serializes the result.
//!
//! One paginator renders one document. It owns its [`PaginationState`]
//! outright, so independent exports never share cursor state.

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use folio_core::{EncodingWarning, Margins, Orientation, PageSize, ReportError, ReportResult};
use tracing::{debug, warn};

use crate::engine::EngineSettings;
use crate::fonts::{FontSet, GlyphEncoder};
use crate::metrics::{FontFace, line_height_mm, text_width_mm};
use crate::pdf::{DrawOp, Page, PdfBuilder};
use crate::request::{ReportRequest, Rgb, TableStyle};
use crate::sink::{ArtifactSink, SavedArtifact};
use crate::text::wrap_text;

const TITLE_Y: f64 = 15.0;
const TITLE_SIZE: f64 = 16.0;
const TITLE_LINE_STEP: f64 = 7.0;
const TIMESTAMP_Y: f64 = 22.0;
const TIMESTAMP_SIZE: f64 = 9.0;
const CONTENT_TOP_WITH_TIMESTAMP: f64 = 30.0;
const CONTENT_TOP: f64 = 25.0;
const FOOTER_OFFSET: f64 = 8.0;
const FOOTER_SIZE: f64 = 8.0;
const CELL_PADDING: f64 = 1.5;
const MIN_AUTO_COLUMN: f64 = 10.0;
const TABLE_GAP: f64 = 4.0;
/// Fraction of a line box above the baseline.
const BASELINE_RATIO: f64 = 0.75;
const EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Configuration and state
// ---------------------------------------------------------------------------

/// Everything the paginator needs to know about one document.
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    pub title: String,
    pub file_name: String,
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub margins: Margins,
    pub show_creation_date: bool,
    pub show_pagination: bool,
    /// Repeat the creation timestamp centered in every page footer.
    pub footer_timestamp: bool,
    pub created_at: DateTime<Local>,
    pub timestamp_format: String,
    pub page_label: String,
    pub text_color: Rgb,
    pub table_font_size: f64,
    pub body_font_size: f64,
    pub font_path: Option<PathBuf>,
    pub bold_font_path: Option<PathBuf>,
}

impl DocumentConfig {
    pub fn from_request(request: &ReportRequest, settings: &EngineSettings) -> Self {
        Self {
            title: request.title.clone(),
            file_name: request.resolved_file_name("pdf"),
            page_size: request.page_size,
            orientation: request.orientation,
            margins: settings.margins,
            show_creation_date: request.show_creation_date,
            show_pagination: request.show_pagination,
            footer_timestamp: false,
            created_at: request.created_at,
            timestamp_format: settings.timestamp_format.clone(),
            page_label: settings.page_label.clone(),
            text_color: request.text_color.unwrap_or(Rgb::BLACK),
            table_font_size: settings.table_font_size,
            body_font_size: settings.body_font_size,
            font_path: settings.font_path.clone(),
            bold_font_path: settings.bold_font_path.clone(),
        }
    }

    pub fn footer_timestamp(mut self, enabled: bool) -> Self {
        self.footer_timestamp = enabled;
        self
    }

    /// Page `(width, height)` in millimetres after orientation.
    pub fn page_dimensions(&self) -> (f64, f64) {
        let (w, h) = self.page_size.dimensions_mm();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// Cursor state for one render pass. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaginationState {
    pub y_position: f64,
    pub page_index: usize,
    pub page_height: f64,
    pub margins: Margins,
}

impl PaginationState {
    /// Lowest y any content may reach on a page.
    pub fn limit(&self) -> f64 {
        self.page_height - self.margins.bottom
    }

    pub fn remaining(&self) -> f64 {
        self.limit() - self.y_position
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Rendering,
    PageFull,
    Finished,
}

/// Font settings for a run of lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f64,
    pub color: Rgb,
    pub indent: f64,
}

impl TextStyle {
    pub fn regular(size: f64, color: Rgb) -> Self {
        Self {
            face: FontFace::Regular,
            size,
            color,
            indent: 0.0,
        }
    }

    pub fn bold(size: f64, color: Rgb) -> Self {
        Self {
            face: FontFace::Bold,
            ..Self::regular(size, color)
        }
    }
}

/// A serialized document that has not been saved yet.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub pages: Vec<Page>,
    pub warnings: Vec<EncodingWarning>,
}

/// Outcome of a completed document export.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub saved: SavedArtifact,
    pub pages: Vec<Page>,
    pub warnings: Vec<EncodingWarning>,
}

impl RenderedReport {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

// ---------------------------------------------------------------------------
// Paginator
// ---------------------------------------------------------------------------

pub struct DocumentPaginator {
    phase: Phase,
    config: Option<DocumentConfig>,
    state: PaginationState,
    page_width: f64,
    pages: Vec<Page>,
    fonts: FontSet,
    encoder: GlyphEncoder,
}

impl Default for DocumentPaginator {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentPaginator {
    pub fn new() -> Self {
        let fonts = FontSet::builtin();
        let encoder = fonts.encoder();
        Self {
            phase: Phase::Idle,
            config: None,
            state: PaginationState {
                y_position: 0.0,
                page_index: 0,
                page_height: 0.0,
                margins: Margins::default(),
            },
            page_width: 0.0,
            pages: Vec::new(),
            fonts,
            encoder,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn warnings(&self) -> &[EncodingWarning] {
        &self.fonts.warnings
    }

    pub fn printable_width(&self) -> f64 {
        self.page_width - self.state.margins.left - self.state.margins.right
    }

    pub fn printable_height(&self) -> f64 {
        self.state.page_height - self.state.margins.top - self.state.margins.bottom
    }

    /// Text as the active font will draw it.
    pub fn encode(&self, text: &str) -> String {
        self.encoder.encode(text)
    }

    fn expect_phase(&self, expected: Phase, operation: &str) -> ReportResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ReportError::render(format!(
                "{operation} called while paginator is {:?}",
                self.phase
            )))
        }
    }

    /// Configuration of the document being rendered, once begun.
    pub fn config(&self) -> Option<&DocumentConfig> {
        self.config.as_ref()
    }

    /// Validate geometry, load fonts, draw the title block and place the
    /// cursor below it.
    pub fn begin_document(&mut self, config: DocumentConfig) -> ReportResult<()> {
        self.expect_phase(Phase::Idle, "begin_document")?;

        let (width, height) = config.page_dimensions();
        validate_geometry(width, height, &config.margins)?;
        let timestamp = format_timestamp(&config)?;

        self.fonts = FontSet::load(config.font_path.as_deref(), config.bold_font_path.as_deref());
        self.encoder = self.fonts.encoder();

        self.page_width = width;
        self.state = PaginationState {
            y_position: 0.0,
            page_index: 0,
            page_height: height,
            margins: config.margins,
        };
        self.pages.push(Page::new(width, height));

        let title = self.encode(&config.title);
        let printable = self.printable_width();
        let title_lines = wrap_text(&title, printable, FontFace::Bold, TITLE_SIZE);
        let extra = (title_lines.len().saturating_sub(1)) as f64 * TITLE_LINE_STEP;
        for (i, line) in title_lines.iter().enumerate() {
            let y = TITLE_Y + i as f64 * TITLE_LINE_STEP;
            self.draw_centered(line, y, FontFace::Bold, TITLE_SIZE, config.text_color);
        }

        let content_top = if config.show_creation_date {
            let ts = self.encode(&timestamp);
            self.draw_centered(&ts, TIMESTAMP_Y + extra, FontFace::Regular, TIMESTAMP_SIZE, config.text_color);
            CONTENT_TOP_WITH_TIMESTAMP + extra
        } else {
            CONTENT_TOP + extra
        };
        self.state.y_position = content_top.max(config.margins.top);
        if self.state.y_position >= self.state.limit() {
            return Err(ReportError::configuration(format!(
                "title block leaves no room for content on a {:.0}mm page",
                height
            )));
        }

        debug!(
            title = %config.title,
            page_width = width,
            page_height = height,
            "Document started"
        );
        self.config = Some(config);
        self.phase = Phase::Rendering;
        Ok(())
    }

    fn current_page(&mut self) -> &mut Page {
        let index = self.state.page_index;
        &mut self.pages[index]
    }

    fn push_op(&mut self, op: DrawOp) {
        self.current_page().ops.push(op);
    }

    fn draw_text(&mut self, x: f64, y: f64, text: &str, face: FontFace, size: f64, color: Rgb) {
        if text.is_empty() {
            return;
        }
        self.push_op(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            face,
            size,
            color,
        });
    }

    fn draw_centered(&mut self, text: &str, y: f64, face: FontFace, size: f64, color: Rgb) {
        let x = (self.page_width - text_width_mm(text, face, size)) / 2.0;
        self.draw_text(x.max(0.0), y, text, face, size, color);
    }

    fn check_cursor(&self) -> ReportResult<()> {
        if self.state.y_position.is_finite() {
            Ok(())
        } else {
            Err(ReportError::render(format!(
                "cursor is not finite on page {}",
                self.state.page_index + 1
            )))
        }
    }

    fn start_page(&mut self) {
        self.phase = Phase::PageFull;
        self.pages.push(Page::new(self.page_width, self.state.page_height));
        self.state.page_index += 1;
        self.state.y_position = self.state.margins.top;
        debug!(page = self.state.page_index + 1, "Started new page");
        self.phase = Phase::Rendering;
    }

    fn at_page_top(&self) -> bool {
        self.state.page_index > 0 && self.state.y_position <= self.state.margins.top + EPSILON
    }

    /// Make sure `height` fits below the cursor, starting a new page when it
    /// does not. Returns whether a page break happened.
    pub fn reserve(&mut self, height: f64) -> ReportResult<bool> {
        self.expect_phase(Phase::Rendering, "reserve")?;
        self.check_cursor()?;
        if !height.is_finite() || height < 0.0 {
            return Err(ReportError::render(format!("invalid block height {height}")));
        }
        if self.state.y_position + height > self.state.limit() + EPSILON && !self.at_page_top() {
            self.start_page();
            return Ok(true);
        }
        Ok(false)
    }

    /// Move the cursor down, never past the bottom limit.
    pub fn advance(&mut self, dy: f64) -> ReportResult<()> {
        self.expect_phase(Phase::Rendering, "advance")?;
        self.state.y_position = (self.state.y_position + dy).min(self.state.limit());
        self.check_cursor()
    }

    /// Draw lines top to bottom, breaking pages line by line.
    pub fn write_lines(&mut self, lines: &[String], line_height: f64, style: &TextStyle) -> ReportResult<()> {
        self.expect_phase(Phase::Rendering, "write_lines")?;
        if !line_height.is_finite() || line_height <= 0.0 || line_height > self.printable_height() {
            return Err(ReportError::configuration(format!(
                "line height {line_height} does not fit the printable area"
            )));
        }

        let x = self.state.margins.left + style.indent;
        for line in lines {
            self.reserve(line_height)?;
            let text = self.encode(line);
            let baseline = self.state.y_position + line_height * BASELINE_RATIO;
            self.draw_text(x, baseline, &text, style.face, style.size, style.color);
            self.state.y_position += line_height;
            self.check_cursor()?;
        }
        Ok(())
    }

    /// Lay out a table, repeating the header on every page it spans.
    ///
    /// `column_widths` may hint some or all columns in millimetres; the rest
    /// share the remaining printable width.
    pub fn write_table(
        &mut self,
        headers: &[String],
        rows: &[Vec<String>],
        column_widths: Option<&[Option<f64>]>,
        style: &TableStyle,
    ) -> ReportResult<()> {
        self.write_table_with_values(headers, rows, rows, column_widths, style)
    }

    /// Like [`write_table`](Self::write_table), but the highlight predicate
    /// sees `values` (the cells before transliteration) while `rows` is
    /// what gets drawn. Both must have the same shape.
    pub fn write_table_with_values(
        &mut self,
        headers: &[String],
        rows: &[Vec<String>],
        values: &[Vec<String>],
        column_widths: Option<&[Option<f64>]>,
        style: &TableStyle,
    ) -> ReportResult<()> {
        self.expect_phase(Phase::Rendering, "write_table")?;
        if headers.is_empty() {
            return Err(ReportError::configuration("table has no columns"));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != headers.len()) {
            return Err(ReportError::configuration(format!(
                "row {} has {} cells, expected {}",
                i + 1,
                row.len(),
                headers.len()
            )));
        }
        if values.len() != rows.len() || values.iter().any(|v| v.len() != headers.len()) {
            return Err(ReportError::configuration("cell values do not match the table rows"));
        }
        if !style.font_size.is_finite() || style.font_size <= 0.0 {
            return Err(ReportError::configuration("table font size must be positive"));
        }

        let widths = resolve_widths(column_widths, headers.len(), self.printable_width())?;
        let line_h = line_height_mm(style.font_size);

        let header_cells = self.layout_cells(headers, &widths, |_| FontFace::Bold, style.font_size);
        let header_h = row_height(&header_cells, line_h);
        let header_space = if style.show_header { header_h } else { 0.0 };
        let max_row_h = self.printable_height()
            - if style.repeat_header { header_space } else { 0.0 };

        let first_row_h = rows
            .first()
            .map(|r| {
                let cells = self.layout_cells(r, &widths, |c| body_face(style, c), style.font_size);
                row_height(&cells, line_h).min(max_row_h)
            })
            .unwrap_or(0.0);

        if style.show_header {
            self.reserve(header_h + first_row_h)?;
            self.draw_header(&header_cells, &widths, header_h, line_h, style);
        }

        for (index, (row, row_values)) in rows.iter().zip(values).enumerate() {
            let mut cells = self.layout_cells(row, &widths, |c| body_face(style, c), style.font_size);
            let mut height = row_height(&cells, line_h);
            if height > max_row_h + EPSILON {
                let keep = (((max_row_h - 2.0 * CELL_PADDING) / line_h).floor() as usize).max(1);
                warn!(row = index + 1, lines = keep, "Row taller than a page; truncating");
                for cell in &mut cells {
                    cell.truncate(keep);
                }
                height = row_height(&cells, line_h);
            }

            if self.reserve(height)? && style.show_header && style.repeat_header {
                self.draw_header(&header_cells, &widths, header_h, line_h, style);
            }
            self.draw_row(index, row_values, &cells, &widths, height, line_h, style);
        }

        self.advance(TABLE_GAP)
    }

    fn layout_cells(
        &self,
        texts: &[String],
        widths: &[f64],
        face_for: impl Fn(usize) -> FontFace,
        size: f64,
    ) -> Vec<Vec<String>> {
        texts
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(col, (text, width))| {
                let encoded = self.encode(text);
                let inner = (width - 2.0 * CELL_PADDING).max(1.0);
                wrap_text(&encoded, inner, face_for(col), size)
            })
            .collect()
    }

    fn draw_header(&mut self, cells: &[Vec<String>], widths: &[f64], height: f64, line_h: f64, style: &TableStyle) {
        let top = self.state.y_position;
        let left = self.state.margins.left;
        self.push_op(DrawOp::Rect {
            x: left,
            y: top,
            width: widths.iter().sum(),
            height,
            fill: style.header_fill,
        });
        let mut x = left;
        for (lines, width) in cells.iter().zip(widths) {
            for (i, line) in lines.iter().enumerate() {
                let baseline = top + CELL_PADDING + i as f64 * line_h + line_h * BASELINE_RATIO;
                self.draw_text(x + CELL_PADDING, baseline, line, FontFace::Bold, style.font_size, style.header_text);
            }
            x += width;
        }
        self.state.y_position += height;
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_row(
        &mut self,
        index: usize,
        values: &[String],
        cells: &[Vec<String>],
        widths: &[f64],
        height: f64,
        line_h: f64,
        style: &TableStyle,
    ) {
        let top = self.state.y_position;
        let left = self.state.margins.left;
        match style.alternate_fill {
            Some(fill) if index % 2 == 0 => self.push_op(DrawOp::Rect {
                x: left,
                y: top,
                width: widths.iter().sum(),
                height,
                fill,
            }),
            _ => {}
        }

        let mut x = left;
        for (col, (lines, width)) in cells.iter().zip(widths).enumerate() {
            let color = match &style.highlight {
                Some(h) if h.matches(col, &values[col]) => h.color,
                _ => style.text_color,
            };
            let face = body_face(style, col);
            for (i, line) in lines.iter().enumerate() {
                let baseline = top + CELL_PADDING + i as f64 * line_h + line_h * BASELINE_RATIO;
                self.draw_text(x + CELL_PADDING, baseline, line, face, style.font_size, color);
            }
            x += width;
        }
        self.state.y_position += height;
    }

    /// Stamp footers and serialize, without saving.
    pub fn finalize(mut self) -> ReportResult<ReportArtifact> {
        self.expect_phase(Phase::Rendering, "finish_document")?;
        let config = self.config.take().ok_or_else(|| ReportError::render("document has not been started"))?;
        let timestamp = self.encode(&format_timestamp(&config)?);

        let total = self.pages.len();
        let footer_y = self.state.page_height - FOOTER_OFFSET;
        let right_edge = self.page_width - config.margins.right;
        for index in 0..total {
            self.state.page_index = index;
            if config.show_pagination {
                let label = self.encode(&format!("{} {} / {}", config.page_label, index + 1, total));
                let x = right_edge - text_width_mm(&label, FontFace::Regular, FOOTER_SIZE);
                self.draw_text(x, footer_y, &label, FontFace::Regular, FOOTER_SIZE, config.text_color);
            }
            if config.footer_timestamp && config.show_creation_date {
                self.draw_centered(&timestamp, footer_y, FontFace::Regular, FOOTER_SIZE, config.text_color);
            }
        }

        let mut builder = PdfBuilder::new(&self.fonts);
        for page in &self.pages {
            builder.add_page(page);
        }
        let bytes = builder.build(&config.title);
        self.phase = Phase::Finished;

        debug!(pages = total, bytes = bytes.len(), "Document serialized");
        Ok(ReportArtifact {
            file_name: config.file_name,
            bytes,
            pages: self.pages,
            warnings: self.fonts.warnings,
        })
    }

    /// Stamp footers, serialize and hand the file to `sink`.
    pub fn finish_document(self, sink: &dyn ArtifactSink) -> ReportResult<RenderedReport> {
        let artifact = self.finalize()?;
        let saved = sink.save(&artifact.file_name, &artifact.bytes)?;
        Ok(RenderedReport {
            saved,
            pages: artifact.pages,
            warnings: artifact.warnings,
        })
    }
}

fn body_face(style: &TableStyle, column: usize) -> FontFace {
    if style.bold_first_column && column == 0 {
        FontFace::Bold
    } else {
        FontFace::Regular
    }
}

fn row_height(cells: &[Vec<String>], line_h: f64) -> f64 {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
    lines as f64 * line_h + 2.0 * CELL_PADDING
}

fn validate_geometry(width: f64, height: f64, margins: &Margins) -> ReportResult<()> {
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return Err(ReportError::configuration(format!(
            "invalid page dimensions {width}x{height}"
        )));
    }
    let sides = [margins.top, margins.right, margins.bottom, margins.left];
    if sides.iter().any(|m| !m.is_finite() || *m < 0.0) {
        return Err(ReportError::configuration("margins must be finite and non-negative"));
    }
    if margins.left + margins.right >= width || margins.top + margins.bottom >= height {
        return Err(ReportError::configuration("margins leave no printable area"));
    }
    Ok(())
}

fn format_timestamp(config: &DocumentConfig) -> ReportResult<String> {
    let mut out = String::new();
    write!(out, "{}", config.created_at.format(&config.timestamp_format)).map_err(|_| {
        ReportError::configuration(format!(
            "invalid timestamp format '{}'",
            config.timestamp_format
        ))
    })?;
    Ok(out)
}

/// Final column widths: hinted columns keep their width, the others share
/// what is left, and everything scales down when the sum overflows.
pub fn resolve_widths(hints: Option<&[Option<f64>]>, columns: usize, available: f64) -> ReportResult<Vec<f64>> {
    let hints: Vec<Option<f64>> = match hints {
        Some(h) if h.len() != columns => {
            return Err(ReportError::configuration(format!(
                "{} column widths given for {columns} columns",
                h.len()
            )));
        }
        Some(h) => h.to_vec(),
        None => vec![None; columns],
    };
    if let Some(bad) = hints.iter().flatten().find(|w| !w.is_finite() || **w <= 0.0) {
        return Err(ReportError::configuration(format!("invalid column width {bad}")));
    }

    let fixed: f64 = hints.iter().flatten().sum();
    let auto = hints.iter().filter(|w| w.is_none()).count();
    let auto_width = if auto > 0 {
        ((available - fixed) / auto as f64).max(MIN_AUTO_COLUMN)
    } else {
        0.0
    };

    let mut widths: Vec<f64> = hints.iter().map(|w| w.unwrap_or(auto_width)).collect();
    let total: f64 = widths.iter().sum();
    if total > available {
        let scale = available / total;
        for w in &mut widths {
            *w *= scale;
        }
    }
    Ok(widths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn config(title: &str) -> DocumentConfig {
        DocumentConfig::from_request(&ReportRequest::new(title), &EngineSettings::default())
    }

    fn started(title: &str) -> DocumentPaginator {
        let mut p = DocumentPaginator::new();
        p.begin_document(config(title)).unwrap();
        p
    }

    fn lines(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn test_begin_document_places_cursor_below_title() {
        let p = started("Report");
        assert_eq!(p.phase(), Phase::Rendering);
        assert_eq!(p.state().y_position, CONTENT_TOP_WITH_TIMESTAMP);
        assert!((p.printable_width() - 182.0).abs() < 1e-9);
        assert!(p.pages()[0].contains_text("Report"));
    }

    #[test]
    fn test_begin_without_timestamp() {
        let mut p = DocumentPaginator::new();
        let request = ReportRequest::new("Report").show_creation_date(false);
        p.begin_document(DocumentConfig::from_request(&request, &EngineSettings::default()))
            .unwrap();
        assert_eq!(p.state().y_position, CONTENT_TOP);
        assert_eq!(p.pages()[0].texts().count(), 1);
    }

    #[test]
    fn test_landscape_swaps_dimensions() {
        let request = ReportRequest::new("Wide").orientation(Orientation::Landscape);
        let cfg = DocumentConfig::from_request(&request, &EngineSettings::default());
        assert_eq!(cfg.page_dimensions(), (297.0, 210.0));
    }

    #[test]
    fn test_title_is_centered() {
        let p = started("Centered");
        let (x, y) = p.pages()[0].text_position("Centered").unwrap();
        let width = text_width_mm("Centered", FontFace::Bold, TITLE_SIZE);
        assert!((x - (210.0 - width) / 2.0).abs() < 1e-9);
        assert_eq!(y, TITLE_Y);
    }

    #[test]
    fn test_invalid_margins_are_configuration_errors() {
        let mut cfg = config("Bad");
        cfg.margins.left = 150.0;
        cfg.margins.right = 100.0;
        let err = DocumentPaginator::new().begin_document(cfg).unwrap_err();
        assert!(matches!(err, ReportError::Configuration(_)));

        let mut cfg = config("Bad");
        cfg.margins.top = f64::NAN;
        assert!(DocumentPaginator::new().begin_document(cfg).is_err());
    }

    #[test]
    fn test_invalid_timestamp_format_is_rejected() {
        let mut cfg = config("Bad");
        cfg.timestamp_format = "%Q%".into();
        let err = DocumentPaginator::new().begin_document(cfg).unwrap_err();
        assert!(matches!(err, ReportError::Configuration(_)));
    }

    #[test]
    fn test_wrong_phase_is_render_error() {
        let mut p = DocumentPaginator::new();
        let err = p.write_lines(&lines(1), 5.0, &TextStyle::regular(10.0, Rgb::BLACK)).unwrap_err();
        assert!(matches!(err, ReportError::Render(_)));

        let mut p = started("Twice");
        assert!(p.begin_document(config("Twice")).is_err());
    }

    #[test]
    fn test_write_lines_breaks_before_overflow() {
        let mut p = started("Lines");
        let line_h = 5.0;
        let style = TextStyle::regular(10.0, Rgb::BLACK);
        // 30 -> 282 holds 50 lines on page 1, 53 on following pages.
        p.write_lines(&lines(60), line_h, &style).unwrap();
        assert_eq!(p.pages().len(), 2);
        assert!(p.pages()[0].contains_text("line 50"));
        assert!(p.pages()[1].contains_text("line 51"));
        let (_, y) = p.pages()[1].text_position("line 51").unwrap();
        assert!((y - (15.0 + line_h * BASELINE_RATIO)).abs() < 1e-9);
    }

    #[test]
    fn test_cursor_never_passes_limit() {
        let mut p = started("Limit");
        let style = TextStyle::regular(10.0, Rgb::BLACK);
        for _ in 0..200 {
            p.write_lines(&lines(1), 7.3, &style).unwrap();
            assert!(p.state().y_position <= p.state().limit() + EPSILON);
        }
    }

    #[test]
    fn test_section_flows_over_three_pages() {
        let mut p = started("Detail");
        let style = TextStyle::regular(10.0, Rgb::BLACK);
        // Continuation pages hold exactly 40 lines of this height.
        let line_h = (297.0 - 15.0 - 15.0) / 40.0;

        p.write_lines(&["Notes".to_string()], line_h, &TextStyle::bold(11.0, Rgb::BLACK))
            .unwrap();
        let first_page_capacity = (p.state().remaining() / line_h + EPSILON).floor() as usize;
        p.write_lines(&lines(first_page_capacity + 80), line_h, &style).unwrap();

        assert_eq!(p.pages().len(), 3);
        let headings: usize = p
            .pages()
            .iter()
            .map(|page| page.texts().filter(|t| *t == "Notes").count())
            .sum();
        assert_eq!(headings, 1);
        assert!(p.pages()[0].contains_text("Notes"));
        assert_eq!(p.pages()[1].texts().count(), 40);
        assert_eq!(p.pages()[2].texts().count(), 40);
    }

    #[test]
    fn test_oversized_line_height_rejected() {
        let mut p = started("Huge");
        let err = p
            .write_lines(&lines(1), 500.0, &TextStyle::regular(10.0, Rgb::BLACK))
            .unwrap_err();
        assert!(matches!(err, ReportError::Configuration(_)));
    }

    #[test]
    fn test_table_repeats_header_on_every_page() {
        let mut p = started("Table");
        let headers = vec!["A".to_string(), "B".to_string()];
        let rows: Vec<Vec<String>> = (0..120)
            .map(|i| vec![format!("a{i}"), format!("b{i}")])
            .collect();
        p.write_table(&headers, &rows, None, &TableStyle::default()).unwrap();

        assert!(p.pages().len() > 1);
        for page in p.pages() {
            assert!(page.contains_text("A"));
            assert!(page.contains_text("B"));
            // Header shading sits above every body row on the page.
            assert_eq!(page.fills().next(), Some(TableStyle::default().header_fill));
        }
        let body_cells: usize = p
            .pages()
            .iter()
            .map(|page| page.texts().filter(|t| t.starts_with('a')).count())
            .sum();
        assert_eq!(body_cells, 120);
    }

    #[test]
    fn test_table_without_repeat_draws_header_once() {
        let mut p = started("Once");
        let headers = vec!["H".to_string()];
        let rows: Vec<Vec<String>> = (0..100).map(|i| vec![format!("r{i}")]).collect();
        let style = TableStyle {
            repeat_header: false,
            ..TableStyle::default()
        };
        p.write_table(&headers, &rows, None, &style).unwrap();
        assert!(p.pages().len() > 1);
        let headers_drawn: usize = p.pages().iter().map(|pg| pg.texts().filter(|t| *t == "H").count()).sum();
        assert_eq!(headers_drawn, 1);
    }

    #[test]
    fn test_alternate_rows_are_shaded() {
        let mut p = started("Stripes");
        let headers = vec!["H".to_string()];
        let rows: Vec<Vec<String>> = (0..4).map(|i| vec![format!("r{i}")]).collect();
        p.write_table(&headers, &rows, None, &TableStyle::default()).unwrap();
        let fills: Vec<Rgb> = p.pages()[0].fills().collect();
        // Header plus rows 0 and 2.
        assert_eq!(fills.len(), 3);
    }

    #[test]
    fn test_highlight_recolors_matching_cells() {
        let mut p = started("Highlight");
        let headers = vec!["Name".to_string(), "Active".to_string()];
        let rows = vec![
            vec!["x".to_string(), "Evet".to_string()],
            vec!["y".to_string(), "Hayır".to_string()],
        ];
        let red = Rgb(200, 0, 0);
        let style = TableStyle::default()
            .highlight(crate::request::CellHighlight::new(red, |col, text| col == 1 && text == "Hayır"));
        p.write_table(&headers, &rows, None, &style).unwrap();

        let colored: Vec<&str> = p.pages()[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, color, .. } if *color == red => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(colored, vec!["Hayir"]);
    }

    #[test]
    fn test_highlight_sees_source_values() {
        let mut p = started("Values");
        let headers = vec!["Active".to_string()];
        let rows = vec![vec!["Hayir".to_string()], vec!["Evet".to_string()]];
        let values = vec![vec!["Hayır".to_string()], vec!["Evet".to_string()]];
        let red = Rgb(200, 0, 0);
        let style = TableStyle::default()
            .highlight(crate::request::CellHighlight::new(red, |_, text| text == "Hayır"));
        p.write_table_with_values(&headers, &rows, &values, None, &style).unwrap();

        let colored: Vec<&str> = p.pages()[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, color, .. } if *color == red => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(colored, vec!["Hayir"]);

        let err = p
            .write_table_with_values(&headers, &rows, &values[..1], None, &style)
            .unwrap_err();
        assert!(matches!(err, ReportError::Configuration(_)));
    }

    #[test]
    fn test_row_length_mismatch_is_configuration_error() {
        let mut p = started("Mismatch");
        let headers = vec!["A".to_string(), "B".to_string()];
        let rows = vec![vec!["only one".to_string()]];
        let err = p.write_table(&headers, &rows, None, &TableStyle::default()).unwrap_err();
        assert!(matches!(err, ReportError::Configuration(_)));
    }

    #[test]
    fn test_tall_rows_are_truncated_to_a_page() {
        let mut p = started("Tall");
        let headers = vec!["Text".to_string()];
        let body = vec!["word"; 4000].join(" ");
        p.write_table(&headers, &[vec![body]], Some(&[Some(20.0)]), &TableStyle::default())
            .unwrap();
        // The row moves to a fresh page together with its header.
        assert_eq!(p.pages().len(), 2);
        assert!(p.pages()[1].contains_text("Text"));
        assert!(p.state().y_position <= p.state().limit() + EPSILON);
    }

    #[test]
    fn test_resolve_widths() {
        let widths = resolve_widths(None, 3, 180.0).unwrap();
        assert_eq!(widths, vec![60.0, 60.0, 60.0]);

        let widths = resolve_widths(Some(&[Some(35.0), None, None]), 3, 175.0).unwrap();
        assert_eq!(widths, vec![35.0, 70.0, 70.0]);

        let widths = resolve_widths(Some(&[Some(100.0), Some(100.0)]), 2, 100.0).unwrap();
        assert_eq!(widths, vec![50.0, 50.0]);

        let widths = resolve_widths(Some(&[Some(20.0), Some(30.0)]), 2, 100.0).unwrap();
        assert_eq!(widths, vec![20.0, 30.0]);

        assert!(resolve_widths(Some(&[Some(20.0)]), 2, 100.0).is_err());
        assert!(resolve_widths(Some(&[Some(-1.0)]), 1, 100.0).is_err());
    }

    #[test]
    fn test_finalize_stamps_page_numbers() {
        let mut p = started("Numbers");
        p.write_lines(&lines(120), 5.0, &TextStyle::regular(10.0, Rgb::BLACK)).unwrap();
        let artifact = p.finalize().unwrap();
        let total = artifact.pages.len();
        assert_eq!(total, 3);
        for (i, page) in artifact.pages.iter().enumerate() {
            assert!(page.contains_text(&format!("Sayfa {} / {}", i + 1, total)));
        }
        assert_eq!(artifact.file_name, "Numbers.pdf");
        assert!(artifact.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_footer_timestamp_only_for_detail_documents() {
        let created = chrono::TimeZone::with_ymd_and_hms(&Local, 2024, 5, 17, 9, 30, 0).unwrap();
        let request = ReportRequest::new("Stamp").created_at(created);

        let mut p = DocumentPaginator::new();
        p.begin_document(DocumentConfig::from_request(&request, &EngineSettings::default()))
            .unwrap();
        let artifact = p.finalize().unwrap();
        let stamps = artifact.pages[0].texts().filter(|t| *t == "17.05.2024 09:30").count();
        assert_eq!(stamps, 1);

        let mut p = DocumentPaginator::new();
        p.begin_document(
            DocumentConfig::from_request(&request, &EngineSettings::default()).footer_timestamp(true),
        )
        .unwrap();
        let artifact = p.finalize().unwrap();
        let stamps = artifact.pages[0].texts().filter(|t| *t == "17.05.2024 09:30").count();
        assert_eq!(stamps, 2);
    }

    #[test]
    fn test_pagination_can_be_disabled() {
        let request = ReportRequest::new("Quiet").show_pagination(false);
        let mut p = DocumentPaginator::new();
        p.begin_document(DocumentConfig::from_request(&request, &EngineSettings::default()))
            .unwrap();
        let artifact = p.finalize().unwrap();
        assert!(!artifact.pages[0].texts().any(|t| t.starts_with("Sayfa")));
    }

    #[test]
    fn test_missing_font_degrades_gracefully() {
        let mut cfg = config("Ünlü Şehirler");
        cfg.font_path = Some(PathBuf::from("/definitely/missing.ttf"));
        let mut p = DocumentPaginator::new();
        p.begin_document(cfg).unwrap();
        assert_eq!(p.warnings().len(), 1);
        assert!(p.pages()[0].contains_text("Unlu Sehirler"));

        let sink = MemorySink::new();
        let report = p.finish_document(&sink).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_finish_document_saves_once() {
        let sink = MemorySink::new();
        let p = started("Saved Report");
        let report = p.finish_document(&sink).unwrap();
        assert_eq!(report.saved.file_name, "Saved_Report.pdf");
        assert_eq!(report.page_count(), 1);
        assert_eq!(sink.artifacts()[0].0, "Saved_Report.pdf");
    }

    #[test]
    fn test_independent_paginators_do_not_share_state() {
        let mut a = started("A");
        let b = started("B");
        a.write_lines(&lines(100), 5.0, &TextStyle::regular(10.0, Rgb::BLACK)).unwrap();
        assert!(a.pages().len() > 1);
        assert_eq!(b.pages().len(), 1);
        assert_eq!(b.state().y_position, CONTENT_TOP_WITH_TIMESTAMP);
    }
}
