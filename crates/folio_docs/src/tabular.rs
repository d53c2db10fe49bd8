//! Tabular PDF reports: one table row per record.

use folio_core::ReportResult;
use tracing::info;

use crate::paginator::{DocumentConfig, DocumentPaginator, RenderedReport};
use crate::request::TableStyle;
use crate::schema::{ColumnDefinition, FieldAccess, validate_columns};
use crate::sink::ArtifactSink;
use crate::text::normalize;

/// A record set projected through its column schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedTable {
    pub headers: Vec<String>,
    /// Transliterated cells, as drawn.
    pub rows: Vec<Vec<String>>,
    /// Cells as the columns produced them, for highlight predicates.
    pub values: Vec<Vec<String>>,
    pub widths: Vec<Option<f64>>,
}

pub fn project_rows<R: FieldAccess>(records: &[R], columns: &[ColumnDefinition<R>]) -> ProjectedTable {
    let values: Vec<Vec<String>> = records
        .iter()
        .map(|record| columns.iter().map(|c| c.project(record)).collect())
        .collect();
    ProjectedTable {
        headers: columns.iter().map(|c| normalize(&c.header)).collect(),
        rows: values
            .iter()
            .map(|row| row.iter().map(|cell| normalize(cell)).collect())
            .collect(),
        values,
        widths: columns.iter().map(|c| c.width).collect(),
    }
}

/// Render `records` as a paginated table and save it through `sink`.
pub fn render_table<R: FieldAccess>(
    config: DocumentConfig,
    records: &[R],
    columns: &[ColumnDefinition<R>],
    style: &TableStyle,
    sink: &dyn ArtifactSink,
) -> ReportResult<RenderedReport> {
    validate_columns(columns)?;
    let table = project_rows(records, columns);

    let title = config.title.clone();
    let mut paginator = DocumentPaginator::new();
    paginator.begin_document(config)?;
    paginator.write_table_with_values(
        &table.headers,
        &table.rows,
        &table.values,
        Some(table.widths.as_slice()),
        style,
    )?;
    let report = paginator.finish_document(sink)?;

    info!(
        title = %title,
        rows = table.rows.len(),
        pages = report.page_count(),
        "Rendered table report"
    );
    Ok(report)
}
