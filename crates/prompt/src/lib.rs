//! Prompt system for LocalAI.
//!
//! This crate turns retrieved evidence into the text handed to the
//! generation backend:
//! - Budget-bounded, deterministic context assembly
//! - YAML prompt definitions with a built-in default
//! - Handlebars template rendering

pub mod assembler;
pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use assembler::assemble;
pub use builder::PromptTemplate;
pub use loader::{load_prompt, load_prompt_or_default};
pub use types::{AssembledContext, ContextEntry, ContextSection, PromptDefinition, Provenance};
