//! Evidence sources for the query pipeline.
//!
//! Uploaded documents live in a SQLite-backed store with their bytes kept as
//! blob files; external knowledge comes from the Wikipedia search API.

pub mod parser;
pub mod store;
pub mod types;
pub mod wiki;


// Re-export commonly used types
pub use store::{DocumentRepository, SqliteDocumentStore};
pub use types::{
    DeleteOutcome, DocumentRecord, EvidenceItem, ExternalResult, ImportPolicy, NewDocument,
};
pub use wiki::{ExternalKnowledge, WikipediaClient};

use localai_core::AppResult;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Summary of a bulk import.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Documents stored
    pub imported: Vec<DocumentRecord>,

    /// Files that were rejected, with the reason
    pub skipped: Vec<(PathBuf, String)>,

    /// Wall-clock time of the import
    pub duration_secs: f64,
}

/// Import files and directory trees into the document store.
///
/// Directories are walked recursively without following links. A file that
/// fails policy checks or storage is recorded in `skipped` and the import
/// continues with the next one.
pub fn import_paths(
    store: &SqliteDocumentStore,
    paths: &[PathBuf],
    policy: &ImportPolicy,
) -> AppResult<ImportReport> {
    let start = Instant::now();
    let mut report = ImportReport::default();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() {
                    import_one(store, entry.path(), policy, &mut report);
                }
            }
        } else {
            import_one(store, path, policy, &mut report);
        }
    }

    report.duration_secs = start.elapsed().as_secs_f64();

    tracing::info!(
        "Import completed: {} stored, {} skipped in {:.2}s",
        report.imported.len(),
        report.skipped.len(),
        report.duration_secs
    );

    Ok(report)
}

fn import_one(
    store: &SqliteDocumentStore,
    path: &Path,
    policy: &ImportPolicy,
    report: &mut ImportReport,
) {
    match store.import_file(path, policy) {
        Ok(record) => {
            tracing::debug!("Imported {:?} as document {}", path, record.id);
            report.imported.push(record);
        }
        Err(e) => {
            tracing::warn!("Skipping {:?}: {}", path, e);
            report.skipped.push((path.to_path_buf(), e.to_string()));
        }
    }
}

/// Dotfiles and dot-directories are skipped during walks.
fn is_hidden(name: &OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}
