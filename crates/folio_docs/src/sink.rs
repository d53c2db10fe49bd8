//! Where finished artifacts go.

use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use folio_core::{ReportError, ReportResult};
use tracing::info;

/// A successfully saved artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub file_name: String,
    /// On-disk location, when the sink writes files.
    pub path: Option<PathBuf>,
    pub bytes_written: usize,
}

/// The platform file-save boundary. Called exactly once per successful
/// export, after the whole artifact has been serialized.
pub trait ArtifactSink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> ReportResult<SavedArtifact>;
}

/// Writes artifacts into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    /// Writes through a `.part` file renamed into place, so a failed write
    /// never leaves a truncated artifact under the final name.
    fn save(&self, file_name: &str, bytes: &[u8]) -> ReportResult<SavedArtifact> {
        if !is_plain_file_name(file_name) {
            return Err(ReportError::configuration(format!(
                "file name {file_name:?} must not contain a directory"
            )));
        }
        let path = self.dir.join(file_name);
        let partial = self.dir.join(format!("{file_name}.part"));

        std::fs::create_dir_all(&self.dir).map_err(|e| ReportError::io(&self.dir, e))?;
        if let Err(e) = std::fs::write(&partial, bytes) {
            let _ = std::fs::remove_file(&partial);
            return Err(ReportError::io(&path, e));
        }
        if let Err(e) = std::fs::rename(&partial, &path) {
            let _ = std::fs::remove_file(&partial);
            return Err(ReportError::io(&path, e));
        }

        info!(file = %path.display(), bytes = bytes.len(), "Saved report");
        Ok(SavedArtifact {
            file_name: file_name.to_string(),
            path: Some(path),
            bytes_written: bytes.len(),
        })
    }
}

/// Exactly one normal path component: no separators, `..` or roots.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Keeps saved artifacts in memory, for callers that ship the bytes
/// elsewhere and for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything saved so far, in save order.
    pub fn artifacts(&self) -> Vec<(String, Vec<u8>)> {
        self.saved
            .lock()
            .map(|saved| saved.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.saved.lock().map(|saved| saved.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactSink for MemorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> ReportResult<SavedArtifact> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| ReportError::render("memory sink lock poisoned"))?;
        saved.push((file_name.to_string(), bytes.to_vec()));
        Ok(SavedArtifact {
            file_name: file_name.to_string(),
            path: None,
            bytes_written: bytes.len(),
        })
    }
}
