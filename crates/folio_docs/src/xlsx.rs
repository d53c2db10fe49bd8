use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde_json::Value;
use tracing::debug;

use folio_core::{ReportError, ReportResult};

use crate::request::with_extension;
use crate::schema::{ColumnDefinition, FieldAccess, validate_columns};
use crate::sink::{ArtifactSink, SavedArtifact};

const SHEET_NAME: &str = "Data";

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn as_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
        }
    }
}

/// Projected contents of the `Data` sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

fn project_cell<R: FieldAccess>(column: &ColumnDefinition<R>, record: &R) -> Cell {
    if column.has_formatter() {
        return Cell::Text(column.project(record));
    }
    match column.raw(record).as_deref() {
        Some(Value::Number(n)) => n.as_f64().map(Cell::Number).unwrap_or_else(|| Cell::Text(n.to_string())),
        _ => Cell::Text(column.project(record)),
    }
}

/// Project `records` through `columns`: a header row, then one row per
/// record in input order.
pub fn build_sheet<R: FieldAccess>(records: &[R], columns: &[ColumnDefinition<R>]) -> ReportResult<SheetData> {
    validate_columns(columns)?;
    Ok(SheetData {
        headers: columns.iter().map(|c| c.header.clone()).collect(),
        rows: records
            .iter()
            .map(|record| columns.iter().map(|c| project_cell(c, record)).collect())
            .collect(),
    })
}

fn workbook_error(what: String) -> impl FnOnce(XlsxError) -> ReportError {
    move |e| ReportError::render(format!("{what}: {e}"))
}

/// Serialize a sheet into xlsx bytes.
pub fn write_workbook(sheet: &SheetData) -> ReportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .map_err(workbook_error(format!("Failed to set sheet name: {SHEET_NAME}")))?;

    let header_format = Format::new().set_bold();
    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(workbook_error(format!("Failed to write header at column {col}")))?;
    }

    for (row_idx, row) in sheet.rows.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            match cell {
                Cell::Number(n) => worksheet
                    .write_number(excel_row, col_idx as u16, *n)
                    .map_err(workbook_error(format!(
                        "Failed to write number at ({excel_row}, {col_idx})"
                    )))?,
                Cell::Text(s) => worksheet
                    .write_string(excel_row, col_idx as u16, s)
                    .map_err(workbook_error(format!(
                        "Failed to write string at ({excel_row}, {col_idx})"
                    )))?,
            };
        }
    }

    workbook
        .save_to_buffer()
        .map_err(workbook_error("Failed to save workbook to buffer".into()))
}

/// Export records as a one-sheet workbook and hand it to `sink`.
///
/// Column width hints only apply to documents; spreadsheet columns keep the
/// application default width.
pub fn export<R: FieldAccess>(
    records: &[R],
    columns: &[ColumnDefinition<R>],
    file_name: &str,
    sink: &dyn ArtifactSink,
) -> ReportResult<SavedArtifact> {
    let sheet = build_sheet(records, columns)?;
    let bytes = write_workbook(&sheet)?;
    debug!(rows = sheet.rows.len(), columns = sheet.headers.len(), "Workbook built");
    sink.save(&with_extension(file_name, "xlsx"), &bytes)
}
