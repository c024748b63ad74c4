//! SQLite-backed document repository.
//!
//! Metadata and extracted text live in a single `documents` table; the
//! uploaded bytes live as blob files under the uploads directory.

use crate::parser;
use crate::types::{DeleteOutcome, DocumentRecord, EvidenceItem, ImportPolicy, NewDocument};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use localai_core::{AppError, AppResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Characters of content kept around a search match.
const EXCERPT_CHARS: usize = 240;

/// Characters shown before the match inside an excerpt.
const EXCERPT_LEAD_CHARS: usize = 60;

/// Document lookup used by the query pipeline.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Case-insensitive substring search over document content, most recent
    /// first, at most `limit` items.
    async fn search(&self, text: &str, limit: usize) -> AppResult<Vec<EvidenceItem>>;

    /// Every stored document, most recent first.
    async fn list_all(&self) -> AppResult<Vec<EvidenceItem>>;

    /// Remove a document and its blob.
    async fn delete_by_id(&self, id: i64) -> AppResult<DeleteOutcome>;
}

/// Document store over a SQLite database and an uploads directory.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
    uploads_dir: PathBuf,
}

impl SqliteDocumentStore {
    /// Open (or create) the database and ensure the schema exists.
    pub fn open(db_path: &Path, uploads_dir: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Storage(format!("Failed to create database directory: {}", e))
            })?;
        }
        fs::create_dir_all(uploads_dir)
            .map_err(|e| AppError::Storage(format!("Failed to create uploads directory: {}", e)))?;

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Storage(format!("Failed to open SQLite database: {}", e)))?;

        init_schema(&conn)?;

        tracing::debug!("Opened document store at {:?}", db_path);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            uploads_dir: uploads_dir.to_path_buf(),
        })
    }

    /// Directory holding document blobs.
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Storage("Document store lock poisoned".to_string()))
    }

    /// Insert a document row and return the stored record.
    pub fn insert_document(&self, doc: &NewDocument) -> AppResult<DocumentRecord> {
        let created_at = Utc::now();
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO documents (filename, original_name, path, size, type, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                doc.filename,
                doc.original_name,
                doc.path.to_string_lossy().to_string(),
                doc.size_bytes as i64,
                doc.doc_type,
                doc.content,
                format_timestamp(&created_at),
            ],
        )
        .map_err(|e| AppError::Storage(format!("Failed to insert document: {}", e)))?;

        let id = conn.last_insert_rowid();
        tracing::debug!("Inserted document {} ({})", id, doc.original_name);

        Ok(DocumentRecord {
            id,
            filename: doc.filename.clone(),
            original_name: doc.original_name.clone(),
            path: doc.path.clone(),
            size_bytes: doc.size_bytes,
            doc_type: doc.doc_type.clone(),
            content: doc.content.clone(),
            created_at,
        })
    }

    /// Copy a file into the uploads directory and record it.
    ///
    /// Text is extracted from `.txt` and `.md` files; other accepted types
    /// are stored without searchable content.
    pub fn import_file(&self, source: &Path, policy: &ImportPolicy) -> AppResult<DocumentRecord> {
        let original_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::Storage(format!("Invalid file name: {:?}", source)))?
            .to_string();

        let doc_type = parser::extension(source);
        if !policy
            .allowed_file_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&doc_type))
        {
            return Err(AppError::Storage(format!(
                "File type '{}' is not allowed (allowed: {})",
                doc_type,
                policy.allowed_file_types.join(", ")
            )));
        }

        let metadata = fs::metadata(source)
            .map_err(|e| AppError::Storage(format!("Failed to stat {:?}: {}", source, e)))?;
        if !metadata.is_file() {
            return Err(AppError::Storage(format!("{:?} is not a regular file", source)));
        }
        if metadata.len() > policy.max_file_size {
            return Err(AppError::Storage(format!(
                "{} is {} bytes, over the {} byte limit",
                original_name,
                metadata.len(),
                policy.max_file_size
            )));
        }

        let filename = format!("{}_{}", uuid::Uuid::new_v4(), original_name);
        let blob_path = self.uploads_dir.join(&filename);
        fs::copy(source, &blob_path)
            .map_err(|e| AppError::Storage(format!("Failed to copy {:?}: {}", source, e)))?;

        let content = parser::extract_text(&blob_path).unwrap_or_else(|e| {
            tracing::warn!("Storing {} without text: {}", original_name, e);
            String::new()
        });

        let stored = self.insert_document(&NewDocument {
            filename,
            original_name,
            path: blob_path.clone(),
            size_bytes: metadata.len(),
            doc_type,
            content,
        });

        if stored.is_err() {
            if let Err(e) = fs::remove_file(&blob_path) {
                tracing::warn!("Failed to remove blob {:?} after failed import: {}", blob_path, e);
            }
        }

        stored
    }

    /// Fetch one document by ID.
    pub fn get_document(&self, id: i64) -> AppResult<DocumentRecord> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, filename, original_name, path, size, type, content, created_at
             FROM documents WHERE id = ?1",
            [id],
            record_from_row,
        )
        .optional()
        .map_err(|e| AppError::Storage(format!("Failed to load document {}: {}", id, e)))?
        .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
    }

    /// Every document, most recent first.
    pub fn list_documents(&self) -> AppResult<Vec<EvidenceItem>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, original_name, type, size, content, created_at FROM documents
                 ORDER BY created_at DESC, id DESC",
            )
            .map_err(|e| AppError::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| evidence_from_row(row, None))
            .map_err(|e| AppError::Storage(format!("Failed to list documents: {}", e)))?;

        let items = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Storage(format!("Failed to read document row: {}", e)))?;

        Ok(items)
    }

    /// Case-insensitive substring search, most recent first.
    pub fn search_documents(&self, text: &str, limit: usize) -> AppResult<Vec<EvidenceItem>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", escape_like(text));
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, original_name, type, size, content, created_at FROM documents
                 WHERE content LIKE ?1 ESCAPE '\\'
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2",
            )
            .map_err(|e| AppError::Storage(format!("Failed to prepare search: {}", e)))?;

        let rows = stmt
            .query_map(params![pattern, limit as i64], |row| {
                evidence_from_row(row, Some(text))
            })
            .map_err(|e| AppError::Storage(format!("Failed to search documents: {}", e)))?;

        let items = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Storage(format!("Failed to read document row: {}", e)))?;

        tracing::debug!("Document search matched {} (limit {})", items.len(), limit);
        Ok(items)
    }

    /// Delete a document: the row first, then its blob.
    ///
    /// Once the row deletion commits the document is gone from every listing
    /// and search. A blob that is already gone is reported as
    /// [`DeleteOutcome::BlobMissing`]; one that cannot be removed as
    /// [`DeleteOutcome::BlobOrphaned`]. Neither is an error.
    pub fn delete_document(&self, id: i64) -> AppResult<DeleteOutcome> {
        let path = {
            let mut conn = self.lock()?;
            let tx = conn
                .transaction()
                .map_err(|e| AppError::Storage(format!("Failed to begin transaction: {}", e)))?;

            let path: Option<String> = tx
                .query_row("SELECT path FROM documents WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(|e| AppError::Storage(format!("Failed to load document {}: {}", id, e)))?;

            let Some(path) = path else {
                return Err(AppError::NotFound(format!("Document {} not found", id)));
            };

            tx.execute("DELETE FROM documents WHERE id = ?1", [id])
                .map_err(|e| AppError::Storage(format!("Failed to delete document {}: {}", id, e)))?;

            tx.commit()
                .map_err(|e| AppError::Storage(format!("Failed to commit delete: {}", e)))?;

            PathBuf::from(path)
        };

        if path.as_os_str().is_empty() {
            return Ok(DeleteOutcome::Deleted { id });
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("Deleted document {}", id);
                Ok(DeleteOutcome::Deleted { id })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Blob for document {} was already missing: {:?}", id, path);
                Ok(DeleteOutcome::BlobMissing { id, path })
            }
            Err(e) => {
                tracing::warn!(
                    "Document {} deleted but blob {:?} could not be removed: {}",
                    id,
                    path,
                    e
                );
                Ok(DeleteOutcome::BlobOrphaned {
                    id,
                    path,
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl DocumentRepository for SqliteDocumentStore {
    async fn search(&self, text: &str, limit: usize) -> AppResult<Vec<EvidenceItem>> {
        let store = self.clone();
        let text = text.to_string();
        run_blocking(move || store.search_documents(&text, limit)).await
    }

    async fn list_all(&self) -> AppResult<Vec<EvidenceItem>> {
        let store = self.clone();
        run_blocking(move || store.list_documents()).await
    }

    async fn delete_by_id(&self, id: i64) -> AppResult<DeleteOutcome> {
        let store = self.clone();
        run_blocking(move || store.delete_document(id)).await
    }
}

async fn run_blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Storage(format!("Document store task failed: {}", e)))?
}

fn init_schema(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL,
            original_name TEXT NOT NULL,
            path TEXT NOT NULL,
            size INTEGER NOT NULL,
            type TEXT NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_documents_created ON documents(created_at);
        "#,
    )
    .map_err(|e| AppError::Storage(format!("Failed to create tables: {}", e)))
}

/// Fixed-width UTC timestamps sort lexically in time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<DocumentRecord> {
    Ok(DocumentRecord {
        id: row.get(0)?,
        filename: row.get(1)?,
        original_name: row.get(2)?,
        path: PathBuf::from(row.get::<_, String>(3)?),
        size_bytes: row.get::<_, i64>(4)? as u64,
        doc_type: row.get(5)?,
        content: row.get(6)?,
        created_at: parse_timestamp(row, 7)?,
    })
}

/// Columns: id, original_name, type, size, content, created_at.
fn evidence_from_row(row: &Row<'_>, needle: Option<&str>) -> rusqlite::Result<EvidenceItem> {
    let content: String = row.get(4)?;
    Ok(EvidenceItem {
        id: row.get(0)?,
        display_name: row.get(1)?,
        doc_type: row.get(2)?,
        size_bytes: row.get::<_, i64>(3)? as u64,
        snippet: excerpt(&content, needle.unwrap_or(""), EXCERPT_CHARS),
        created_at: parse_timestamp(row, 5)?,
    })
}

/// Escape LIKE wildcards so the search text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A window of at most `max_chars` characters around the first match.
///
/// Matching is ASCII case-insensitive, the same as SQLite's `LIKE`.
fn excerpt(content: &str, needle: &str, max_chars: usize) -> String {
    let match_at = if needle.is_empty() {
        0
    } else {
        content
            .to_ascii_lowercase()
            .find(&needle.to_ascii_lowercase())
            .unwrap_or(0)
    };

    let lead_start = content[..match_at]
        .char_indices()
        .rev()
        .nth(EXCERPT_LEAD_CHARS.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let start = if match_at == 0 { 0 } else { lead_start };

    let window: String = content[start..].chars().take(max_chars).collect();
    let truncated_tail = content[start..].chars().nth(max_chars).is_some();

    let mut out = String::new();
    if start > 0 {
        out.push_str("...");
    }
    out.push_str(window.trim());
    if truncated_tail {
        out.push_str("...");
    }
    out
}
