//! Records, column projections and the per-domain width tables.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use folio_core::{ReportError, ReportResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Read access to a record's fields by column key.
///
/// Implemented for the loose [`Record`] map; callers with typed rows can
/// implement it to project their own structs through the same columns.
pub trait FieldAccess {
    fn field(&self, key: &str) -> Option<Cow<'_, Value>>;
}

/// An opaque string-keyed record. Unknown fields are carried along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON object.
    pub fn from_json(value: Value) -> ReportResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ReportError::configuration(format!(
                "record must be a JSON object, got {other}"
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// The field as display text (`""` when missing or null).
    pub fn display(&self, key: &str) -> String {
        self.0.get(key).map(stringify_value).unwrap_or_default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FieldAccess for Record {
    fn field(&self, key: &str) -> Option<Cow<'_, Value>> {
        self.0.get(key).map(Cow::Borrowed)
    }
}

impl FieldAccess for Map<String, Value> {
    fn field(&self, key: &str) -> Option<Cow<'_, Value>> {
        self.get(key).map(Cow::Borrowed)
    }
}

/// Stringify a raw JSON value for display.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

pub type Formatter<R> = Arc<dyn Fn(&R) -> String + Send + Sync>;

/// One output column: which field to read, what to call it, and optionally
/// how wide it is (millimetres, document only) and how to format it.
pub struct ColumnDefinition<R = Record> {
    pub key: String,
    pub header: String,
    pub width: Option<f64>,
    formatter: Option<Formatter<R>>,
}

impl<R> Clone for ColumnDefinition<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            header: self.header.clone(),
            width: self.width,
            formatter: self.formatter.clone(),
        }
    }
}

impl<R> fmt::Debug for ColumnDefinition<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDefinition")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("width", &self.width)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

impl<R: FieldAccess> ColumnDefinition<R> {
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            width: None,
            formatter: None,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Fill the width from the domain table unless one was set explicitly.
    pub fn with_domain_width(mut self, domain: WidthDomain) -> Self {
        if self.width.is_none() {
            self.width = resolve_column_width(&self.key, domain);
        }
        self
    }

    pub fn with_formatter(mut self, formatter: impl Fn(&R) -> String + Send + Sync + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn has_formatter(&self) -> bool {
        self.formatter.is_some()
    }

    /// Raw field value for this column.
    pub fn raw<'r>(&self, record: &'r R) -> Option<Cow<'r, Value>> {
        record.field(&self.key)
    }

    /// Display text: formatter output verbatim, else the stringified value.
    pub fn project(&self, record: &R) -> String {
        match &self.formatter {
            Some(format) => format(record),
            None => self
                .raw(record)
                .map(|v| stringify_value(&v))
                .unwrap_or_default(),
        }
    }
}

/// Reject schemas that would produce a header-less, empty output.
pub fn validate_columns<R>(columns: &[ColumnDefinition<R>]) -> ReportResult<()> {
    if columns.is_empty() {
        return Err(ReportError::configuration("column schema is empty"));
    }
    if let Some(col) = columns.iter().find(|c| c.key.trim().is_empty()) {
        return Err(ReportError::configuration(format!(
            "column '{}' has an empty key",
            col.header
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Width tables
// ---------------------------------------------------------------------------

/// Record domains with their own document column widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthDomain {
    Member,
    User,
}

const MEMBER_WIDTHS: &[(&str, f64)] = &[
    ("memberNo", 20.0),
    ("fullName", 35.0),
    ("nationalId", 28.0),
    ("phone", 28.0),
    ("email", 45.0),
    ("city", 25.0),
    ("district", 25.0),
    ("birthDate", 22.0),
    ("registrationDate", 25.0),
    ("status", 20.0),
    ("duesBalance", 22.0),
];

const USER_WIDTHS: &[(&str, f64)] = &[
    ("username", 30.0),
    ("fullName", 40.0),
    ("email", 50.0),
    ("role", 25.0),
    ("isActive", 18.0),
    ("lastLogin", 32.0),
    ("createdAt", 28.0),
];

impl WidthDomain {
    fn table(self) -> &'static [(&'static str, f64)] {
        match self {
            Self::Member => MEMBER_WIDTHS,
            Self::User => USER_WIDTHS,
        }
    }
}

/// Static width hint for `field_name`; `None` means auto width.
pub fn resolve_column_width(field_name: &str, domain: WidthDomain) -> Option<f64> {
    domain
        .table()
        .iter()
        .find(|(name, _)| *name == field_name)
        .map(|(_, width)| *width)
}
