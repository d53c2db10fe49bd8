use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for every export and render call.
///
/// `Configuration` and `Render` are raised before anything reaches the file
/// sink, so a failed call never leaves a partial file behind.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Failed to save {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Classification of errors for logging and caller display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Invalid column schema or page geometry supplied by the caller.
    ConfigError,
    /// Layout or serialization failed while building the document.
    RenderError,
    /// The platform file save failed.
    IoError,
}

impl ReportError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the broad error category for routing and display purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::ConfigError,
            Self::Render(_) => ErrorCategory::RenderError,
            Self::Io { .. } => ErrorCategory::IoError,
        }
    }

    /// Fatal errors abort the call before the sink runs.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }

    /// Returns a caller-friendly message (hides internal details).
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(msg) => format!("Report configuration issue: {msg}"),
            Self::Render(_) => "The report could not be laid out.".into(),
            Self::Io { path, .. } => format!("Could not save {}.", path.display()),
        }
    }
}

/// A recoverable problem with a font or other render asset.
///
/// Never returned as an error: the paginator logs it, records it on the
/// finished artifact and falls back to transliterated glyphs.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Encoding warning for {asset}: {reason}")]
pub struct EncodingWarning {
    pub asset: String,
    pub reason: String,
}

impl EncodingWarning {
    pub fn new(asset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            reason: reason.into(),
        }
    }
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping() {
        assert_eq!(
            ReportError::configuration("no columns").category(),
            ErrorCategory::ConfigError
        );
        assert_eq!(
            ReportError::render("cursor is NaN").category(),
            ErrorCategory::RenderError
        );
        let io = ReportError::io(
            "/tmp/out.pdf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(io.category(), ErrorCategory::IoError);
    }

    #[test]
    fn test_fatality() {
        assert!(ReportError::configuration("x").is_fatal());
        assert!(ReportError::render("x").is_fatal());
        let io = ReportError::io("a.pdf", std::io::Error::other("disk full"));
        assert!(!io.is_fatal());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = ReportError::configuration("column schema is empty");
        assert_eq!(err.to_string(), "Configuration error: column schema is empty");

        let io = ReportError::io("/out/report.pdf", std::io::Error::other("disk full"));
        let msg = io.to_string();
        assert!(msg.contains("/out/report.pdf"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_user_message_hides_render_internals() {
        let err = ReportError::render("page index overflow at 0x7f");
        assert_eq!(err.user_message(), "The report could not be laid out.");
    }

    #[test]
    fn test_encoding_warning_display() {
        let warning = EncodingWarning::new("DejaVuSans.ttf", "file not found");
        assert_eq!(
            warning.to_string(),
            "Encoding warning for DejaVuSans.ttf: file not found"
        );
    }
}
