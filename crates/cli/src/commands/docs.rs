//! Document command handler.
//!
//! Manages the uploaded document store.

use anyhow::Result;
use clap::{Args, Subcommand};
use localai_core::config::AppConfig;
use localai_knowledge::{
    import_paths, DocumentRepository, EvidenceItem, ImportPolicy,
    SqliteDocumentStore,
};
use std::path::PathBuf;

/// Document store management
#[derive(Args, Debug)]
pub struct DocsCommand {
    #[command(subcommand)]
    pub action: DocsAction,
}

#[derive(Subcommand, Debug)]
pub enum DocsAction {
    /// Add files or directories
    Add(DocsAddCommand),
    /// List stored documents, most recent first
    List(DocsListCommand),
    /// Search document content
    Search(DocsSearchCommand),
    /// Show one document with its text
    Show(DocsShowCommand),
    /// Delete a document and its file
    Delete(DocsDeleteCommand),
}

impl DocsCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        let store = SqliteDocumentStore::open(&config.database_file(), &config.uploads_dir())?;

        match &self.action {
            DocsAction::Add(cmd) => cmd.execute(config, &store),
            DocsAction::List(cmd) => cmd.execute(&store).await,
            DocsAction::Search(cmd) => cmd.execute(config, &store).await,
            DocsAction::Show(cmd) => cmd.execute(&store),
            DocsAction::Delete(cmd) => cmd.execute(&store).await,
        }
    }
}

/// Add documents
#[derive(Args, Debug)]
pub struct DocsAddCommand {
    /// Files or directories to add
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DocsAddCommand {
    pub fn execute(&self, config: &AppConfig, store: &SqliteDocumentStore) -> Result<()> {
        tracing::info!("Adding documents from {} paths", self.paths.len());

        let policy = ImportPolicy {
            max_file_size: config.max_file_size,
            allowed_file_types: config.allowed_file_types.clone(),
        };
        let report = import_paths(store, &self.paths, &policy)?;

        if self.json {
            let skipped: Vec<_> = report
                .skipped
                .iter()
                .map(|(path, reason)| serde_json::json!({ "path": path, "reason": reason }))
                .collect();
            let output = serde_json::json!({
                "imported": report.imported,
                "skipped": skipped,
                "durationSecs": report.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for record in &report.imported {
                println!(
                    "Added #{} {} ({} bytes)",
                    record.id, record.original_name, record.size_bytes
                );
            }
            for (path, reason) in &report.skipped {
                println!("Skipped {}: {}", path.display(), reason);
            }
            println!(
                "{} added, {} skipped in {:.2}s",
                report.imported.len(),
                report.skipped.len(),
                report.duration_secs
            );
        }

        Ok(())
    }
}

/// List documents
#[derive(Args, Debug)]
pub struct DocsListCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DocsListCommand {
    pub async fn execute(&self, store: &SqliteDocumentStore) -> Result<()> {
        let documents = store.list_all().await?;
        print_items(&documents, self.json, "No documents stored")
    }
}

/// Search documents
#[derive(Args, Debug)]
pub struct DocsSearchCommand {
    /// Text to look for (case-insensitive)
    pub text: String,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DocsSearchCommand {
    pub async fn execute(&self, config: &AppConfig, store: &SqliteDocumentStore) -> Result<()> {
        let limit = self.limit.unwrap_or(config.max_sources);
        let hits = store.search(&self.text, limit).await?;
        print_items(&hits, self.json, "No matching documents")
    }
}

/// Show a document
#[derive(Args, Debug)]
pub struct DocsShowCommand {
    /// Document ID
    pub id: i64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DocsShowCommand {
    pub fn execute(&self, store: &SqliteDocumentStore) -> Result<()> {
        let record = store.get_document(self.id)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&record)?);
        } else {
            println!("#{} {}", record.id, record.original_name);
            println!("Type:    {}", record.doc_type);
            println!("Size:    {} bytes", record.size_bytes);
            println!("Added:   {}", record.created_at.to_rfc3339());
            println!("File:    {}", record.path.display());
            println!();
            if record.content.is_empty() {
                println!("(no extracted text)");
            } else {
                println!("{}", record.content);
            }
        }

        Ok(())
    }
}

/// Delete a document
#[derive(Args, Debug)]
pub struct DocsDeleteCommand {
    /// Document ID
    pub id: i64,
}

impl DocsDeleteCommand {
    pub async fn execute(&self, store: &SqliteDocumentStore) -> Result<()> {
        let outcome = store.delete_by_id(self.id).await?;
        println!("Deleted document #{}", outcome.id());
        if let Some(warning) = outcome.warning() {
            eprintln!("warning: {}", warning);
        }
        Ok(())
    }
}

fn print_items(items: &[EvidenceItem], json: bool, empty_message: &str) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("{}", empty_message);
        return Ok(());
    }

    for item in items {
        println!(
            "#{:<5} {:<32} {:>6} {:>10} B  {}",
            item.id,
            item.display_name,
            item.doc_type,
            item.size_bytes,
            item.created_at.format("%Y-%m-%d %H:%M")
        );
        if !item.snippet.is_empty() {
            let snippet: String = item.snippet.split_whitespace().collect::<Vec<_>>().join(" ");
            println!("       {}", snippet);
        }
    }

    Ok(())
}
