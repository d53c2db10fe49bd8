//! Detail PDF reports: a label/value grid followed by free-text sections
//! that flow across pages.

use folio_core::{ReportError, ReportResult};
use tracing::info;

use crate::metrics::{FontFace, line_height_mm};
use crate::paginator::{DocumentConfig, DocumentPaginator, RenderedReport, TextStyle};
use crate::request::{Rgb, TableStyle};
use crate::sink::ArtifactSink;
use crate::text::{html_to_flow_text, wrap_text};

const LABEL_COLUMN_RATIO: f64 = 0.35;
const HEADING_SIZE: f64 = 12.0;
const SECTION_GAP: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Plain(String),
    /// Markup flattened with [`html_to_flow_text`] before layout.
    Html(String),
}

impl SectionBody {
    pub fn flow_text(&self) -> String {
        match self {
            SectionBody::Plain(text) => text.trim().to_string(),
            SectionBody::Html(markup) => html_to_flow_text(markup),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSection {
    pub heading: String,
    pub body: SectionBody,
}

impl DetailSection {
    pub fn plain(heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: SectionBody::Plain(body.into()),
        }
    }

    pub fn html(heading: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: SectionBody::Html(markup.into()),
        }
    }
}

fn grid_style(font_size: f64, text_color: Rgb) -> TableStyle {
    TableStyle {
        show_header: false,
        repeat_header: false,
        bold_first_column: true,
        text_color,
        ..TableStyle::default()
    }
    .font_size(font_size)
}

fn write_grid(paginator: &mut DocumentPaginator, pairs: &[(String, String)], style: &TableStyle) -> ReportResult<()> {
    if pairs.is_empty() {
        return Ok(());
    }
    let headers = vec![String::new(), String::new()];
    let rows: Vec<Vec<String>> = pairs
        .iter()
        .map(|(label, value)| vec![label.clone(), value.clone()])
        .collect();
    let widths = [Some(paginator.printable_width() * LABEL_COLUMN_RATIO), None];
    paginator.write_table(&headers, &rows, Some(&widths[..]), style)
}

fn write_section(
    paginator: &mut DocumentPaginator,
    section: &DetailSection,
    body_size: f64,
    color: Rgb,
) -> ReportResult<()> {
    let width = paginator.printable_width();
    let heading_style = TextStyle::bold(HEADING_SIZE, color);
    let body_style = TextStyle::regular(body_size, color);
    let heading_h = line_height_mm(HEADING_SIZE);
    let body_h = line_height_mm(body_size);

    let heading = wrap_text(&paginator.encode(&section.heading), width, FontFace::Bold, HEADING_SIZE);
    let text = section.body.flow_text();
    let body = if text.is_empty() {
        Vec::new()
    } else {
        wrap_text(&paginator.encode(&text), width, FontFace::Regular, body_size)
    };

    // A heading never ends a page on its own.
    let first_body_line = if body.is_empty() { 0.0 } else { body_h };
    paginator.reserve(heading.len() as f64 * heading_h + first_body_line)?;
    paginator.write_lines(&heading, heading_h, &heading_style)?;
    paginator.write_lines(&body, body_h, &body_style)?;
    paginator.advance(SECTION_GAP)
}

/// Render a detail document and save it through `sink`.
pub fn render_detail(
    config: DocumentConfig,
    pairs: &[(String, String)],
    sections: &[DetailSection],
    sink: &dyn ArtifactSink,
) -> ReportResult<RenderedReport> {
    if pairs.is_empty() && sections.is_empty() {
        return Err(ReportError::configuration("detail report has no content"));
    }
    let title = config.title.clone();
    let body_size = config.body_font_size;
    let color = config.text_color;
    let grid = grid_style(config.table_font_size, color);

    let mut paginator = DocumentPaginator::new();
    paginator.begin_document(config.footer_timestamp(true))?;
    write_grid(&mut paginator, pairs, &grid)?;
    for section in sections {
        write_section(&mut paginator, section, body_size, color)?;
    }
    let report = paginator.finish_document(sink)?;

    info!(
        title = %title,
        sections = sections.len(),
        pages = report.page_count(),
        "Rendered detail report"
    );
    Ok(report)
}
