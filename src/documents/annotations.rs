//! Highlights and notes, stored as a JSON sidecar next to each document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::documents::base_name;

pub const ANNOTATIONS_SUFFIX: &str = ".annotations.json";

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("invalid document name '{0}'")]
    InvalidName(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed annotations in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A highlighted passage. Fields other than `text` are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sidecar contents. Missing lists read as empty so older files keep loading
/// when fields are added; top-level keys this version does not know are kept
/// in `extra` and written back on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Highlight {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: Map::new(),
        }
    }
}

impl Note {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationStore {
    root: PathBuf,
}

impl AnnotationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, document: &str) -> Result<PathBuf, AnnotationError> {
        let name = base_name(document).ok_or_else(|| AnnotationError::InvalidName(document.to_string()))?;
        Ok(self.root.join(format!("{name}{ANNOTATIONS_SUFFIX}")))
    }

    pub fn load(&self, document: &str) -> Result<Annotations, AnnotationError> {
        let path = self.path_for(document)?;
        if !path.exists() {
            return Ok(Annotations::default());
        }

        let raw = std::fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
        serde_json::from_str(&raw).map_err(|source| AnnotationError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Overwrites the sidecar wholesale. Concurrent saves race; the last one wins.
    pub fn save(&self, document: &str, annotations: &Annotations) -> Result<(), AnnotationError> {
        let path = self.path_for(document)?;
        let json = serde_json::to_string_pretty(annotations).map_err(|source| AnnotationError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(&path, json).map_err(|source| io_error(&path, source))?;
        debug!(
            document,
            highlights = annotations.highlights.len(),
            notes = annotations.notes.len(),
            "Saved annotations"
        );
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> AnnotationError {
    AnnotationError::Io {
        path: path.display().to_string(),
        source,
    }
}
