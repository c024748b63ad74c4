//! Query orchestration for LocalAI.
//!
//! The [`Orchestrator`] answers a [`Query`] by gathering document evidence
//! and external knowledge concurrently, assembling a bounded prompt, and
//! generating a response with the currently loaded model.
//!
//! # Example
//! ```no_run
//! use localai_query::{Orchestrator, Query};
//!
//! # async fn example(orchestrator: Orchestrator) -> Result<(), Box<dyn std::error::Error>> {
//! orchestrator.load_model("llama2").await?;
//! let result = orchestrator
//!     .handle_query(&Query::new("capital of France").with_external_knowledge(true))
//!     .await?;
//! println!("{} (model: {})", result.response, result.model_used);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod orchestrator;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export main types
pub use error::OrchestratorError;
pub use orchestrator::{Orchestrator, OrchestratorSettings};
pub use state::CurrentModelState;
pub use types::{Query, QueryResult, QuerySources, QueryWarning};
