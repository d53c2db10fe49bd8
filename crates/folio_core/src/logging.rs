use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::FolioConfig;

const LOG_FILE_PREFIX: &str = "folio";

/// Where export logs go and how verbose they are. `RUST_LOG` overrides
/// `filter` when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub dir: PathBuf,
    pub filter: String,
    /// Mirror events to stderr in compact form.
    pub console: bool,
}

impl LogSettings {
    /// `~/.folio/logs` at the configured level, with engine internals at
    /// debug.
    pub fn from_config(config: &FolioConfig) -> Result<Self> {
        Ok(Self {
            dir: FolioConfig::logs_dir()?,
            filter: default_filter(&config.log_level),
            console: true,
        })
    }
}

fn default_filter(level: &str) -> String {
    let level = if level.trim().is_empty() { "info" } else { level.trim() };
    format!("{level},folio_docs=debug")
}

/// Install the global subscriber: a daily rolling file plus, optionally,
/// a compact console layer. Keep the guard alive while exports run.
pub fn install(settings: &LogSettings) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&settings.dir)?;

    let file_appender = tracing_appender::rolling::daily(&settings.dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter));
    let console = settings
        .console
        .then(|| fmt::layer().with_target(false).compact());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .with(console)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}

/// Host entry point: logging as described by the user's config file.
pub fn init_logging(config: &FolioConfig) -> Result<WorkerGuard> {
    install(&LogSettings::from_config(config)?)
}

/// File-only logging into `logs_dir`, for tests and hosts that own their
/// log location.
pub fn init_logging_to_dir(logs_dir: &Path, filter: &str) -> Result<WorkerGuard> {
    install(&LogSettings {
        dir: logs_dir.to_path_buf(),
        filter: filter.to_string(),
        console: false,
    })
}
