//! Failures that abort a query.

use localai_core::AppError;
use thiserror::Error;

/// A query failed on its mandatory path.
///
/// Evidence and external knowledge failures never appear here; they degrade
/// to empty sources and are reported as [`crate::QueryWarning`]s instead.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Rejected before any adapter was called
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Generation was attempted before any model load succeeded
    #[error("No model loaded; load a model before querying")]
    NoModelLoaded,

    /// The generation backend failed or the prompt could not be rendered
    #[error("Generation failed: {0}")]
    GenerationFailed(#[source] AppError),
}
