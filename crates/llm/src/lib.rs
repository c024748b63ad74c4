//! Generation backend crate for LocalAI.
//!
//! This crate wraps the language-model runtime behind the [`LlmClient`]
//! trait and manages model files on disk through [`ModelCatalog`].
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default and only provider)
//!
//! # Example
//! ```no_run
//! use localai_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! client.load_model("llama2").await?;
//! let request = LlmRequest::new("Hello, world!", "llama2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use catalog::ModelCatalog;
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::OllamaClient;
pub use types::{ModelFile, ProviderType};
