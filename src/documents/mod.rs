//! The upload directory: stored PDFs, their text extracts and annotation sidecars.

pub mod annotations;
pub mod converter;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use converter::{ConvertError, DocumentConverter};

pub const PDF_EXTENSION: &str = ".pdf";
pub const EXTRACT_EXTENSION: &str = ".md";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid file name '{0}'")]
    InvalidName(String),
    #[error("document '{0}' not found")]
    NotFound(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error("conversion task failed: {0}")]
    Task(String),
}

/// Reduces a client-supplied name to its final path component.
///
/// Both `/` and `\` count as separators. Returns `None` when nothing usable
/// is left (`""`, `"."`, `".."`, or a trailing separator).
pub fn base_name(name: &str) -> Option<&str> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    match last {
        "" | "." | ".." => None,
        other => Some(other),
    }
}

/// Extract file name for a document: `paper.pdf` -> `paper.md`.
pub fn extract_file_name(document: &str) -> String {
    let stem = document.strip_suffix(PDF_EXTENSION).unwrap_or(document);
    format!("{stem}{EXTRACT_EXTENSION}")
}

#[derive(Clone)]
pub struct DocumentLibrary {
    root: PathBuf,
    converter: Arc<dyn DocumentConverter>,
}

impl DocumentLibrary {
    pub fn new(root: impl Into<PathBuf>, converter: Arc<dyn DocumentConverter>) -> Self {
        Self {
            root: root.into(),
            converter,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_root(&self) -> Result<(), DocumentError> {
        std::fs::create_dir_all(&self.root).map_err(|source| io_error(&self.root, source))
    }

    pub fn document_path(&self, name: &str) -> Result<PathBuf, DocumentError> {
        let name = base_name(name).ok_or_else(|| DocumentError::InvalidName(name.to_string()))?;
        Ok(self.root.join(name))
    }

    pub fn extract_path(&self, name: &str) -> Result<PathBuf, DocumentError> {
        let name = base_name(name).ok_or_else(|| DocumentError::InvalidName(name.to_string()))?;
        Ok(self.root.join(extract_file_name(name)))
    }

    /// Names of the stored PDFs, sorted.
    pub fn list(&self) -> Result<Vec<String>, DocumentError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(io_error(&self.root, source)),
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.to_lowercase().ends_with(PDF_EXTENSION))
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn read(&self, name: &str) -> Result<Vec<u8>, DocumentError> {
        let path = self.document_path(name)?;
        std::fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                DocumentError::NotFound(name.to_string())
            } else {
                io_error(&path, source)
            }
        })
    }

    /// Stores an uploaded file under its base name and writes its text extract
    /// next to it. Returns the stored name.
    pub async fn ingest(&self, file_name: &str, bytes: &[u8]) -> Result<String, DocumentError> {
        let name = base_name(file_name)
            .ok_or_else(|| DocumentError::InvalidName(file_name.to_string()))?
            .to_string();

        self.ensure_root()?;
        let pdf_path = self.root.join(&name);
        tokio::fs::write(&pdf_path, bytes)
            .await
            .map_err(|source| io_error(&pdf_path, source))?;
        info!(document = %name, bytes = bytes.len(), "Stored upload");

        let text = self.convert(&pdf_path).await?;
        if text.trim().is_empty() {
            warn!(document = %name, "No text could be extracted");
        }

        let extract_path = self.extract_path(&name)?;
        tokio::fs::write(&extract_path, text.as_bytes())
            .await
            .map_err(|source| io_error(&extract_path, source))?;
        info!(document = %name, extract = %extract_path.display(), "Converted document");

        Ok(name)
    }

    async fn convert(&self, pdf_path: &Path) -> Result<String, DocumentError> {
        let converter = self.converter.clone();
        let path = pdf_path.to_path_buf();
        tokio::task::spawn_blocking(move || converter.convert(&path))
            .await
            .map_err(|e| DocumentError::Task(e.to_string()))?
            .map_err(DocumentError::from)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> DocumentError {
    DocumentError::Io {
        path: path.display().to_string(),
        source,
    }
}
