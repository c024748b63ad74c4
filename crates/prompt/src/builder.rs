//! Prompt builder for rendering the final generation prompt.

use crate::types::PromptDefinition;
use handlebars::Handlebars;
use localai_core::{AppError, AppResult};
use std::collections::HashMap;

const TEMPLATE_NAME: &str = "prompt";

/// A compiled prompt template.
///
/// The template is parsed once at construction, so a malformed definition
/// fails at startup rather than on the first query.
pub struct PromptTemplate {
    id: String,
    registry: Handlebars<'static>,
}

impl PromptTemplate {
    /// Compile a prompt definition.
    ///
    /// # Example
    /// ```
    /// use localai_prompt::{PromptDefinition, PromptTemplate};
    ///
    /// let template = PromptTemplate::compile(&PromptDefinition::default()).unwrap();
    /// let prompt = template.render("", "What is Rust?").unwrap();
    /// assert_eq!(prompt, "Question: What is Rust?\n\nAnswer:");
    /// ```
    pub fn compile(definition: &PromptDefinition) -> AppResult<Self> {
        let mut registry = Handlebars::new();

        // Disable HTML escaping for plain text
        registry.register_escape_fn(handlebars::no_escape);
        // Unknown variables are render errors, not empty strings
        registry.set_strict_mode(true);

        registry
            .register_template_string(TEMPLATE_NAME, &definition.template)
            .map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to register template '{}': {}",
                    definition.id, e
                ))
            })?;

        tracing::debug!("Compiled prompt template: {}", definition.id);

        Ok(Self {
            id: definition.id.clone(),
            registry,
        })
    }

    /// Identifier of the definition this template came from.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Render the prompt for an assembled context and query.
    pub fn render(&self, context: &str, query: &str) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("context", context);
        variables.insert("query", query);

        self.registry
            .render(TEMPLATE_NAME, &variables)
            .map_err(|e| AppError::Prompt(format!("Failed to render template '{}': {}", self.id, e)))
    }
}

impl std::fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptTemplate").field("id", &self.id).finish()
    }
}
