//! Model command handler.
//!
//! Manages model files and the model the backend generates with.

use crate::state::CliState;
use anyhow::Result;
use clap::{Args, Subcommand};
use localai_core::config::AppConfig;
use localai_query::Orchestrator;

/// Model management
#[derive(Args, Debug)]
pub struct ModelsCommand {
    #[command(subcommand)]
    pub action: ModelsAction,
}

#[derive(Subcommand, Debug)]
pub enum ModelsAction {
    /// List model files in the models directory
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download a model file
    Download {
        /// File name to store the model under
        name: String,
        /// URL to download from
        url: String,
    },
    /// Load a model on the backend and make it current
    Load {
        /// Model name as known to the backend (e.g. llama2)
        name: String,
    },
    /// Delete a model file
    Delete {
        /// File name of the model
        name: String,
    },
    /// Show the current model
    Current,
}

impl ModelsCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        let state_file = config.state_file();

        if let ModelsAction::Current = self.action {
            match CliState::load(&state_file)?.current_model {
                Some(name) => println!("{}", name),
                None => println!("No model loaded"),
            }
            return Ok(());
        }

        let orchestrator = Orchestrator::from_config(config)?;

        match &self.action {
            ModelsAction::List { json } => {
                let models = orchestrator.list_models()?;
                if *json {
                    println!("{}", serde_json::to_string_pretty(&models)?);
                } else if models.is_empty() {
                    println!("No model files in {}", config.models_dir().display());
                } else {
                    for model in &models {
                        println!("{:<40} {:>12} bytes", model.name, model.size_bytes);
                    }
                }
            }
            ModelsAction::Download { name, url } => {
                let model = orchestrator.download_model(name, url).await?;
                println!(
                    "Downloaded {} ({} bytes) to {}",
                    model.name,
                    model.size_bytes,
                    model.path.display()
                );
            }
            ModelsAction::Load { name } => {
                orchestrator.load_model(name).await?;

                let mut state = CliState::load(&state_file)?;
                state.current_model = orchestrator.current_model().await;
                state.save(&state_file)?;

                println!("Loaded model {}", name);
            }
            ModelsAction::Delete { name } => {
                orchestrator.delete_model(name)?;
                println!("Deleted model file {}", name);
            }
            ModelsAction::Current => {}
        }

        Ok(())
    }
}
