// Report export: spreadsheets and paginated PDF documents

pub mod aggregate;
pub mod detail;
pub mod engine;
pub mod fonts;
pub mod metrics;
pub mod paginator;
pub mod pdf;
pub mod request;
pub mod schema;
pub mod sink;
pub mod tabular;
pub mod text;
pub mod xlsx;

pub use aggregate::{FieldRule, Group, Summarizer, SummaryPlan, group_by_correlation_key, summarize};
pub use detail::{DetailSection, SectionBody, render_detail};
pub use engine::{EngineSettings, ReportEngine};
pub use paginator::{DocumentConfig, DocumentPaginator, Phase, RenderedReport, ReportArtifact, TextStyle};
pub use request::{CellHighlight, ReportRequest, Rgb, TableStyle};
pub use schema::{ColumnDefinition, FieldAccess, Record, WidthDomain, resolve_column_width};
pub use sink::{ArtifactSink, DirectorySink, MemorySink, SavedArtifact};
pub use tabular::render_table;
pub use text::{html_to_flow_text, normalize, wrap_text};
