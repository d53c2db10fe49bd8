use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

// ---------------------------------------------------------------------------
// Page setup
// ---------------------------------------------------------------------------

/// Paper sizes understood by the document renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    A3,
    Letter,
}

impl PageSize {
    /// Portrait `(width, height)` in millimetres.
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::A3 => (297.0, 420.0),
            Self::Letter => (215.9, 279.4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 15.0,
            right: 14.0,
            bottom: 15.0,
            left: 14.0,
        }
    }
}

// ---------------------------------------------------------------------------
// FolioConfig
// ---------------------------------------------------------------------------

/// Engine configuration stored at `~/.folio/config.json`.
///
/// Per-export settings (title, colors, page size for one call) live on the
/// report request; this file only carries installation-wide defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    // Output
    pub output_dir: Option<PathBuf>,

    // Document text
    pub page_label: String,
    pub timestamp_format: String,

    // Fonts (optional TrueType assets; built-in Helvetica otherwise)
    pub font_path: Option<PathBuf>,
    pub bold_font_path: Option<PathBuf>,

    // Layout
    pub default_page_size: PageSize,
    pub default_orientation: Orientation,
    pub margins_mm: Margins,
    pub table_font_size: f64,
    pub body_font_size: f64,

    // General
    pub log_level: String,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            page_label: "Sayfa".into(),
            timestamp_format: "%d.%m.%Y %H:%M".into(),
            font_path: None,
            bold_font_path: None,
            default_page_size: PageSize::A4,
            default_orientation: Orientation::Portrait,
            margins_mm: Margins::default(),
            table_font_size: 9.0,
            body_font_size: 10.0,
            log_level: "info".into(),
        }
    }
}

impl FolioConfig {
    /// Returns the base config directory: `~/.folio/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".folio"))
    }

    /// Returns the config file path: `~/.folio/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.folio/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Returns the default export directory: `~/.folio/exports/`
    pub fn exports_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("exports"))
    }

    /// Resolved output directory (configured, else `~/.folio/exports/`).
    pub fn resolved_output_dir(&self) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::exports_dir(),
        }
    }

    /// Ensures all required directories exist.
    pub fn ensure_dirs() -> Result<()> {
        let dirs = [Self::base_dir()?, Self::logs_dir()?, Self::exports_dir()?];
        for dir in &dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads config from disk, or creates default if missing.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self =
                serde_json::from_str(&content).with_context(|| "Failed to parse config.json")?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Saves config to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to_path(&path)
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}
