//! Local model catalog.
//!
//! Model files are opaque named blobs in a single directory. The catalog can
//! list them, download a new one from a URL, and delete one by name. It knows
//! nothing about which model the backend currently has loaded.

use crate::types::ModelFile;
use futures::StreamExt;
use localai_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Catalog of model files under one directory.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    /// Directory holding model files
    root: PathBuf,

    /// HTTP client used for downloads
    client: reqwest::Client,
}

impl ModelCatalog {
    /// Create a catalog rooted at `root`. The directory is created lazily.
    ///
    /// `timeout` bounds connecting and each read from the server; a download
    /// as a whole may take as long as the data keeps arriving.
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            root: root.into(),
            client,
        }
    }

    /// Directory this catalog manages.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List model files, sorted by name.
    ///
    /// A missing directory is an empty catalog, not an error.
    pub fn list(&self) -> AppResult<Vec<ModelFile>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut models = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                AppError::Llm(format!("Failed to read models directory: {}", e))
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
            models.push(ModelFile {
                name: entry.file_name().to_string_lossy().to_string(),
                path: entry.path().to_path_buf(),
                size_bytes,
            });
        }

        Ok(models)
    }

    /// Download a model file from `url` and store it under `name`.
    ///
    /// The body is streamed to disk. On any failure the partial file is
    /// removed so the catalog never lists a truncated model.
    pub async fn download(&self, name: &str, url: &str) -> AppResult<ModelFile> {
        let name = validate_name(name)?;

        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(name);

        tracing::info!("Downloading model '{}' from {}", name, url);

        match self.fetch_to(&path, url).await {
            Ok(size_bytes) => {
                tracing::info!("Downloaded model '{}' ({} bytes)", name, size_bytes);
                Ok(ModelFile {
                    name: name.to_string(),
                    path,
                    size_bytes,
                })
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!("Failed to remove partial model {:?}: {}", path, cleanup);
                    }
                }
                Err(e)
            }
        }
    }

    async fn fetch_to(&self, path: &Path, url: &str) -> AppResult<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to download model: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Llm(format!(
                "Model download failed: HTTP {}",
                response.status().as_u16()
            )));
        }

        let mut file = tokio::fs::File::create(path).await?;
        let mut written = 0u64;
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let bytes =
                chunk.map_err(|e| AppError::Llm(format!("Model download interrupted: {}", e)))?;
            file.write_all(&bytes).await?;
            written += bytes.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    }

    /// Delete a model file by name.
    pub fn delete(&self, name: &str) -> AppResult<()> {
        let name = validate_name(name)?;

        let path = self.root.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("Deleted model '{}'", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("model '{}'", name)))
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

/// Trim a model name, rejecting names that would escape the catalog directory.
fn validate_name(name: &str) -> AppResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed.contains("..")
        || trimmed.contains('/')
        || trimmed.contains('\\')
    {
        return Err(AppError::Config(format!("Invalid model name: {:?}", name)));
    }
    Ok(trimmed)
}
