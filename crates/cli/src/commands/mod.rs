//! Command handlers for the LocalAI CLI.

pub mod ask;
pub mod docs;
pub mod models;
pub mod wiki;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use docs::DocsCommand;
pub use models::ModelsCommand;
pub use wiki::WikiCommand;
