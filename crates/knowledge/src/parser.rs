//! Document type detection and text extraction.
//!
//! Only plain text and Markdown are extracted. PDF and DOCX documents are
//! accepted and stored, but carry no searchable text.

use localai_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Document type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Markdown,
    Pdf,
    Docx,
    Unknown,
}

impl DocumentKind {
    /// Detect document kind from file extension.
    pub fn from_path(path: &Path) -> Self {
        match extension(path).as_str() {
            ".txt" => Self::PlainText,
            ".md" | ".markdown" => Self::Markdown,
            ".pdf" => Self::Pdf,
            ".docx" => Self::Docx,
            _ => Self::Unknown,
        }
    }

    /// Whether text can be extracted from this kind.
    pub fn is_extractable(&self) -> bool {
        matches!(self, Self::PlainText | Self::Markdown)
    }
}

/// Lower-cased extension with its leading dot, or an empty string.
pub fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Extract searchable text from a stored file.
///
/// Text files are stored verbatim so substring search sees exactly what was
/// uploaded. Unsupported binary formats yield an empty string.
pub fn extract_text(path: &Path) -> AppResult<String> {
    let kind = DocumentKind::from_path(path);

    if !kind.is_extractable() {
        tracing::debug!("No text extraction for {:?} ({:?})", path, kind);
        return Ok(String::new());
    }

    let bytes = fs::read(path)
        .map_err(|e| AppError::Storage(format!("Failed to read {:?}: {}", path, e)))?;

    String::from_utf8(bytes)
        .map_err(|_| AppError::Storage(format!("{:?} is not valid UTF-8 text", path)))
}
