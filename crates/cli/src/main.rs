//! LocalAI CLI
//!
//! Main entry point for the localai command-line tool.
//! Answers questions from uploaded documents, Wikipedia and a local model.

mod commands;
mod state;

use clap::{Parser, Subcommand};
use commands::{AskCommand, DocsCommand, ModelsCommand, WikiCommand};
use localai_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// LocalAI CLI - question answering over local documents and a local model
#[derive(Parser, Debug)]
#[command(name = "localai")]
#[command(about = "Question answering over local documents and a local model", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "LOCALAI_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "LOCALAI_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Ollama base URL
    #[arg(long, global = true, env = "OLLAMA_URL")]
    ollama_url: Option<String>,

    /// Model to generate with
    #[arg(short, long, global = true, env = "LOCALAI_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question
    Ask(AskCommand),

    /// Manage uploaded documents
    Docs(DocsCommand),

    /// Search Wikipedia
    Wiki(WikiCommand),

    /// Manage models
    Models(ModelsCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration; the workspace and config file flags decide
    // which YAML file is merged
    let config = AppConfig::load_with(cli.workspace.clone(), cli.config.clone())?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.ollama_url,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("LocalAI CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Ollama: {}", config.ollama_url);

    config.validate()?;
    config.ensure_dirs()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Docs(_) => "docs",
        Commands::Wiki(_) => "wiki",
        Commands::Models(_) => "models",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Docs(cmd) => cmd.execute(&config).await,
        Commands::Wiki(cmd) => cmd.execute(&config).await,
        Commands::Models(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_flags() {
        let cli = Cli::try_parse_from([
            "localai",
            "ask",
            "capital of France",
            "--wiki",
            "--no-documents",
            "--max-sources",
            "3",
            "--model",
            "llama3",
        ])
        .unwrap();

        assert_eq!(cli.model.as_deref(), Some("llama3"));
        match cli.command {
            Commands::Ask(ask) => {
                assert_eq!(ask.question.as_deref(), Some("capital of France"));
                assert!(ask.wiki);
                assert!(ask.no_documents);
                assert_eq!(ask.max_sources, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_docs_delete() {
        let cli = Cli::try_parse_from(["localai", "docs", "delete", "7"]).unwrap();
        match cli.command {
            Commands::Docs(docs) => match docs.action {
                commands::docs::DocsAction::Delete(cmd) => assert_eq!(cmd.id, 7),
                other => panic!("unexpected action: {:?}", other),
            },
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_docs_add_requires_path() {
        assert!(Cli::try_parse_from(["localai", "docs", "add"]).is_err());
    }
}
