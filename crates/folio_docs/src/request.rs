use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use folio_core::{Orientation, PageSize};
use serde::{Deserialize, Serialize};

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Components scaled to the 0..=1 range PDF operators expect.
    pub fn unit(self) -> (f64, f64, f64) {
        (
            self.0 as f64 / 255.0,
            self.1 as f64 / 255.0,
            self.2 as f64 / 255.0,
        )
    }
}

pub const DEFAULT_HEADER_COLOR: Rgb = Rgb(41, 128, 185);
pub const DEFAULT_ALTERNATE_ROW_COLOR: Rgb = Rgb(245, 245, 245);

/// Caller configuration for one export invocation.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub title: String,
    pub file_name: Option<String>,
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub show_creation_date: bool,
    pub show_pagination: bool,
    pub header_color: Option<Rgb>,
    pub alternate_row_color: Option<Rgb>,
    pub text_color: Option<Rgb>,
    pub created_at: DateTime<Local>,
}

impl ReportRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            file_name: None,
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            show_creation_date: true,
            show_pagination: true,
            header_color: None,
            alternate_row_color: None,
            text_color: None,
            created_at: Local::now(),
        }
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.page_size = size;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn show_creation_date(mut self, show: bool) -> Self {
        self.show_creation_date = show;
        self
    }

    pub fn show_pagination(mut self, show: bool) -> Self {
        self.show_pagination = show;
        self
    }

    pub fn header_color(mut self, color: Rgb) -> Self {
        self.header_color = Some(color);
        self
    }

    pub fn alternate_row_color(mut self, color: Rgb) -> Self {
        self.alternate_row_color = Some(color);
        self
    }

    pub fn text_color(mut self, color: Rgb) -> Self {
        self.text_color = Some(color);
        self
    }

    pub fn created_at(mut self, at: DateTime<Local>) -> Self {
        self.created_at = at;
        self
    }

    /// The given file name, or the title with spaces replaced by
    /// underscores; `extension` is appended when missing. The result is
    /// always a single path component (see [`sanitize_file_name`]).
    pub fn resolved_file_name(&self, extension: &str) -> String {
        let base = match &self.file_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => self.title.trim().replace(' ', "_"),
        };
        with_extension(&sanitize_file_name(&base), extension)
    }
}

const FALLBACK_FILE_STEM: &str = "report";

/// Replace path separators, reserved characters and control characters with
/// `_` and strip leading dots, so the name cannot leave the output directory.
pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stripped = replaced.trim_start_matches('.').trim();
    if stripped.is_empty() {
        FALLBACK_FILE_STEM.to_string()
    } else {
        stripped.to_string()
    }
}

/// Append `.{extension}` unless `name` already ends with it.
pub fn with_extension(name: &str, extension: &str) -> String {
    let suffix = format!(".{extension}");
    if name.to_lowercase().ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

// ---------------------------------------------------------------------------
// Table styling
// ---------------------------------------------------------------------------

type CellPredicate = Arc<dyn Fn(usize, &str) -> bool + Send + Sync>;

/// Recolors the text of body cells matching a predicate on
/// `(column_index, cell_text)`.
#[derive(Clone)]
pub struct CellHighlight {
    pub color: Rgb,
    predicate: CellPredicate,
}

impl CellHighlight {
    pub fn new(color: Rgb, predicate: impl Fn(usize, &str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            color,
            predicate: Arc::new(predicate),
        }
    }

    pub fn matches(&self, column: usize, text: &str) -> bool {
        (self.predicate)(column, text)
    }
}

impl fmt::Debug for CellHighlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellHighlight")
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct TableStyle {
    pub header_fill: Rgb,
    pub header_text: Rgb,
    pub alternate_fill: Option<Rgb>,
    pub text_color: Rgb,
    pub font_size: f64,
    pub show_header: bool,
    pub repeat_header: bool,
    pub bold_first_column: bool,
    pub highlight: Option<CellHighlight>,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            header_fill: DEFAULT_HEADER_COLOR,
            header_text: Rgb::WHITE,
            alternate_fill: Some(DEFAULT_ALTERNATE_ROW_COLOR),
            text_color: Rgb::BLACK,
            font_size: 9.0,
            show_header: true,
            repeat_header: true,
            bold_first_column: false,
            highlight: None,
        }
    }
}

impl TableStyle {
    /// Colors from the request, falling back to the defaults.
    pub fn from_request(request: &ReportRequest) -> Self {
        let defaults = Self::default();
        Self {
            header_fill: request.header_color.unwrap_or(defaults.header_fill),
            alternate_fill: Some(
                request
                    .alternate_row_color
                    .unwrap_or(DEFAULT_ALTERNATE_ROW_COLOR),
            ),
            text_color: request.text_color.unwrap_or(defaults.text_color),
            ..defaults
        }
    }

    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    pub fn highlight(mut self, highlight: CellHighlight) -> Self {
        self.highlight = Some(highlight);
        self
    }
}
