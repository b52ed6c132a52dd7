//! PDF to text conversion.
//!
//! The library treats conversion as a black box: anything that can turn a
//! PDF on disk into plain text implements [`DocumentConverter`].

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to extract text from {path}: {message}")]
    Extract { path: String, message: String },
}

pub trait DocumentConverter: Send + Sync {
    fn convert(&self, pdf_path: &Path) -> Result<String, ConvertError>;
}

/// Converter backed by the `pdf-extract` crate.
pub struct PdfExtractConverter;

impl DocumentConverter for PdfExtractConverter {
    fn convert(&self, pdf_path: &Path) -> Result<String, ConvertError> {
        // Scanned PDFs come back empty; that is still a successful conversion.
        let text = pdf_extract::extract_text(pdf_path).map_err(|e| ConvertError::Extract {
            path: pdf_path.display().to_string(),
            message: e.to_string(),
        })?;

        // pdf-extract separates pages with form feeds; keep them as blank lines so
        // line-oriented search output stays readable.
        Ok(text.replace('\x0C', "\n\n"))
    }
}

