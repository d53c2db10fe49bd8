//! Shared plumbing for the Folio export engine: the user config file, the
//! error taxonomy and logging.
//!
//! Hosts install logging once at startup and hold the guard:
//!
//! ```no_run
//! let config = folio_core::FolioConfig::load()?;
//! let _guard = folio_core::init_logging(&config)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::{FolioConfig, Margins, Orientation, PageSize};
pub use error::{EncodingWarning, ErrorCategory, ReportError, ReportResult};
pub use logging::{LogSettings, init_logging, init_logging_to_dir};
