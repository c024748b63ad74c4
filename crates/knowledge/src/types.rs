//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A persisted document record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Row identifier
    pub id: i64,

    /// Blob file name inside the uploads directory
    pub filename: String,

    /// Name the document was uploaded under
    pub original_name: String,

    /// Blob location on disk
    pub path: PathBuf,

    /// Blob size in bytes
    pub size_bytes: u64,

    /// File extension including the dot (e.g. ".md")
    pub doc_type: String,

    /// Extracted text (empty when extraction is unsupported)
    pub content: String,

    /// Insertion time; defines recency order
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when inserting a document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub filename: String,
    pub original_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub doc_type: String,
    pub content: String,
}

/// A document reference handed to the query pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Document identifier
    pub id: i64,

    /// Human-readable name
    pub display_name: String,

    /// Excerpt of the content around the match (may be empty)
    pub snippet: String,

    /// File extension including the dot
    pub doc_type: String,

    /// Blob size in bytes
    pub size_bytes: u64,

    /// Insertion time
    pub created_at: DateTime<Utc>,
}

/// A hit from the external knowledge service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalResult {
    /// Page title
    pub title: String,

    /// Plain-text excerpt
    pub extract: String,

    /// Short description, when the service provides one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Canonical page URL
    pub url: String,

    /// Thumbnail image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Rank-derived relevance in (0, 1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f32>,
}

/// Result of deleting a document.
///
/// The metadata row is always gone when this is returned; only the blob may
/// have been left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Record and blob removed
    Deleted { id: i64 },

    /// Record removed, blob was already gone from disk
    BlobMissing { id: i64, path: PathBuf },

    /// Record removed, blob removal failed
    BlobOrphaned {
        id: i64,
        path: PathBuf,
        reason: String,
    },
}

impl DeleteOutcome {
    /// Identifier of the deleted document.
    pub fn id(&self) -> i64 {
        match self {
            Self::Deleted { id } | Self::BlobMissing { id, .. } | Self::BlobOrphaned { id, .. } => {
                *id
            }
        }
    }

    /// Whether the blob was left on disk.
    pub fn is_inconsistent(&self) -> bool {
        matches!(self, Self::BlobOrphaned { .. })
    }

    /// Warning for the caller when the delete was not clean.
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Deleted { .. } => None,
            Self::BlobMissing { path, .. } => {
                Some(format!("file {} was already missing", path.display()))
            }
            Self::BlobOrphaned { path, reason, .. } => Some(format!(
                "file {} could not be removed: {}",
                path.display(),
                reason
            )),
        }
    }
}

/// Limits applied when importing files.
#[derive(Debug, Clone)]
pub struct ImportPolicy {
    /// Largest accepted file, in bytes
    pub max_file_size: u64,

    /// Accepted extensions with leading dot, compared case-insensitively
    pub allowed_file_types: Vec<String>,
}

impl Default for ImportPolicy {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            allowed_file_types: [".pdf", ".txt", ".docx", ".md"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_outcome_accessors() {
        let ok = DeleteOutcome::Deleted { id: 3 };
        assert_eq!(ok.id(), 3);
        assert!(!ok.is_inconsistent());
        assert_eq!(ok.warning(), None);

        let missing = DeleteOutcome::BlobMissing {
            id: 5,
            path: PathBuf::from("/tmp/gone"),
        };
        assert_eq!(missing.id(), 5);
        assert!(!missing.is_inconsistent());
        assert_eq!(
            missing.warning().as_deref(),
            Some("file /tmp/gone was already missing")
        );

        let orphan = DeleteOutcome::BlobOrphaned {
            id: 4,
            path: PathBuf::from("/tmp/x"),
            reason: "permission denied".to_string(),
        };
        assert_eq!(orphan.id(), 4);
        assert!(orphan.is_inconsistent());
        assert!(orphan.warning().unwrap().contains("permission denied"));
    }

    #[test]
    fn test_delete_outcome_serialization() {
        let json = serde_json::to_value(DeleteOutcome::Deleted { id: 9 }).unwrap();
        assert_eq!(json["outcome"], "deleted");
        assert_eq!(json["id"], 9);

        let json = serde_json::to_value(DeleteOutcome::BlobMissing {
            id: 2,
            path: PathBuf::from("blob.txt"),
        })
        .unwrap();
        assert_eq!(json["outcome"], "blob_missing");
    }
}
