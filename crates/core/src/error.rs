//! Error types for LocalAI.
//!
//! This module defines a unified error enum that covers the error categories
//! shared by the adapters: configuration, I/O, generation backend, document
//! storage, external knowledge, and prompt rendering.

use thiserror::Error;

/// Unified error type for LocalAI.
///
/// Adapter functions return `Result<T, AppError>`. The query orchestrator
/// maps these into its own typed failures before they reach a caller.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generation backend and model catalog errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// External knowledge service errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Document repository errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// A requested document or model does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Whether this error reports a missing document or model.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
