//! Stateless entry point tying requests, renderers and the output sink
//! together.

use std::path::PathBuf;

use folio_core::{FolioConfig, Margins, ReportError, ReportResult};
use tracing::debug;

use crate::detail::{self, DetailSection};
use crate::paginator::{DocumentConfig, RenderedReport};
use crate::request::{ReportRequest, TableStyle};
use crate::schema::{ColumnDefinition, FieldAccess};
use crate::sink::{ArtifactSink, DirectorySink, SavedArtifact};
use crate::{tabular, xlsx};

/// Settings shared by every export an engine performs.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub page_label: String,
    pub timestamp_format: String,
    pub font_path: Option<PathBuf>,
    pub bold_font_path: Option<PathBuf>,
    pub margins: Margins,
    pub table_font_size: f64,
    pub body_font_size: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&FolioConfig::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &FolioConfig) -> Self {
        Self {
            page_label: config.page_label.clone(),
            timestamp_format: config.timestamp_format.clone(),
            font_path: config.font_path.clone(),
            bold_font_path: config.bold_font_path.clone(),
            margins: config.margins_mm,
            table_font_size: config.table_font_size,
            body_font_size: config.body_font_size,
        }
    }
}

/// Runs exports against one sink. Holds no per-export state: every call
/// builds its own paginator.
pub struct ReportEngine {
    settings: EngineSettings,
    sink: Box<dyn ArtifactSink + Send + Sync>,
}

impl ReportEngine {
    pub fn new(settings: EngineSettings, sink: Box<dyn ArtifactSink + Send + Sync>) -> Self {
        Self { settings, sink }
    }

    /// Engine writing into the configured output directory.
    pub fn from_config(config: &FolioConfig) -> ReportResult<Self> {
        let dir = config
            .resolved_output_dir()
            .map_err(|e| ReportError::configuration(format!("{e:#}")))?;
        Ok(Self::new(
            EngineSettings::from_config(config),
            Box::new(DirectorySink::new(dir)),
        ))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn document_config(&self, request: &ReportRequest) -> DocumentConfig {
        DocumentConfig::from_request(request, &self.settings)
    }

    pub fn export_spreadsheet<R: FieldAccess>(
        &self,
        request: &ReportRequest,
        records: &[R],
        columns: &[ColumnDefinition<R>],
    ) -> ReportResult<SavedArtifact> {
        debug!(title = %request.title, records = records.len(), "Exporting spreadsheet");
        xlsx::export(
            records,
            columns,
            &request.resolved_file_name("xlsx"),
            self.sink.as_ref(),
        )
    }

    /// Tabular PDF using the request's colors and the configured table font.
    pub fn render_table<R: FieldAccess>(
        &self,
        request: &ReportRequest,
        records: &[R],
        columns: &[ColumnDefinition<R>],
    ) -> ReportResult<RenderedReport> {
        let style = TableStyle::from_request(request).font_size(self.settings.table_font_size);
        self.render_table_styled(request, records, columns, &style)
    }

    pub fn render_table_styled<R: FieldAccess>(
        &self,
        request: &ReportRequest,
        records: &[R],
        columns: &[ColumnDefinition<R>],
        style: &TableStyle,
    ) -> ReportResult<RenderedReport> {
        debug!(title = %request.title, records = records.len(), "Rendering table report");
        tabular::render_table(
            self.document_config(request),
            records,
            columns,
            style,
            self.sink.as_ref(),
        )
    }

    pub fn render_detail(
        &self,
        request: &ReportRequest,
        pairs: &[(String, String)],
        sections: &[DetailSection],
    ) -> ReportResult<RenderedReport> {
        debug!(title = %request.title, sections = sections.len(), "Rendering detail report");
        detail::render_detail(self.document_config(request), pairs, sections, self.sink.as_ref())
    }
}
