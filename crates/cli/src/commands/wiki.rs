//! Wikipedia command handler.

use anyhow::Result;
use clap::{Args, Subcommand};
use localai_core::config::AppConfig;
use localai_knowledge::{ExternalKnowledge, WikipediaClient};
use std::time::Duration;

/// External knowledge lookup
#[derive(Args, Debug)]
pub struct WikiCommand {
    #[command(subcommand)]
    pub action: WikiAction,
}

#[derive(Subcommand, Debug)]
pub enum WikiAction {
    /// Search Wikipedia
    Search(WikiSearchCommand),
}

impl WikiCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        match &self.action {
            WikiAction::Search(cmd) => cmd.execute(config).await,
        }
    }
}

/// Search Wikipedia
#[derive(Args, Debug)]
pub struct WikiSearchCommand {
    /// Search text
    pub text: String,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl WikiSearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        tracing::info!("Searching Wikipedia for {:?}", self.text);

        let client = WikipediaClient::with_options(
            &config.wiki_api_url,
            self.limit.unwrap_or(config.wiki_results),
            Duration::from_secs(config.request_timeout_secs),
        );
        let results = client.search(&self.text).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
            return Ok(());
        }

        if results.is_empty() {
            println!("No results");
            return Ok(());
        }

        for result in &results {
            match &result.description {
                Some(description) => println!("{} ({})", result.title, description),
                None => println!("{}", result.title),
            }
            println!("  {}", result.url);
            if !result.extract.is_empty() {
                println!("  {}", result.extract);
            }
            println!();
        }

        Ok(())
    }
}
