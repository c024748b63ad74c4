//! Ask command handler.
//!
//! Answers a question from uploaded documents, optional Wikipedia results,
//! and the generation backend.

use crate::state::CliState;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use localai_core::config::AppConfig;
use localai_query::{Orchestrator, Query, QueryResult};
use std::path::PathBuf;

/// Ask a question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Do not search uploaded documents
    #[arg(long)]
    pub no_documents: bool,

    /// Include Wikipedia search results
    #[arg(long)]
    pub wiki: bool,

    /// Maximum number of documents used as context
    #[arg(long)]
    pub max_sources: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.question_text()?;

        let orchestrator = Orchestrator::from_config(config)?;

        // A fresh process has no current model; restore the configured or last loaded one
        let state = CliState::load(&config.state_file())?;
        let model = config.model.clone().or(state.current_model);
        match model.as_deref() {
            Some(name) => orchestrator
                .load_model(name)
                .await
                .with_context(|| format!("Failed to load model '{}'", name))?,
            None => {
                return Err(anyhow!(
                    "No model selected. Run `localai models load <name>` or pass --model."
                ))
            }
        }

        let mut query = Query::new(question)
            .with_documents(!self.no_documents)
            .with_external_knowledge(self.wiki);
        if let Some(max_sources) = self.max_sources {
            query = query.with_max_sources(max_sources);
        }
        if let Some(name) = model {
            query = query.with_model(name);
        }

        let result = orchestrator.handle_query(&query).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_result(&result);
        }

        Ok(())
    }

    /// Get the question from the argument or the file.
    fn question_text(&self) -> Result<String> {
        if let Some(question) = &self.question {
            return Ok(question.clone());
        }

        if let Some(path) = &self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read question file {:?}", path));
        }

        Err(anyhow!("No question provided"))
    }
}

fn print_result(result: &QueryResult) {
    println!("{}", result.response.trim());
    println!();

    let sources = &result.sources;
    if sources.documents.is_empty() && sources.external.is_empty() {
        println!("Sources: (none)");
    } else {
        println!("Sources:");
        for doc in &sources.documents {
            println!("- [doc #{}] {}", doc.id, doc.display_name);
        }
        for ext in &sources.external {
            println!("- [wiki] {} <{}>", ext.title, ext.url);
        }
    }

    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }

    eprintln!(
        "({} in {:.2}s)",
        result.model_used, result.processing_time_seconds
    );
}
