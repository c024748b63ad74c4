//! Prompt types for LocalAI.

use serde::{Deserialize, Serialize};

/// Identifier of the built-in query prompt.
pub const DEFAULT_PROMPT_ID: &str = "query.default";

/// Template reproducing the classic "context, question, answer" layout.
///
/// The context block is only emitted when at least one section survived
/// assembly, so a query without evidence renders to the bare question.
pub const DEFAULT_TEMPLATE: &str = "{{#if context}}Based on the following context, please answer the question.\n\nContext:\n{{context}}\n{{/if}}Question: {{query}}\n\nAnswer:";

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion", default = "default_api_version")]
    pub api_version: String,

    /// Template string with Handlebars syntax.
    ///
    /// Available variables: `context` (may be empty) and `query`.
    pub template: String,
}

fn default_api_version() -> String {
    "1.0".to_string()
}

impl Default for PromptDefinition {
    fn default() -> Self {
        Self {
            id: DEFAULT_PROMPT_ID.to_string(),
            title: "Answer a question from documents and external knowledge".to_string(),
            api_version: default_api_version(),
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

/// Where a context section came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Uploaded documents from the evidence repository
    Document,
    /// Results from the external knowledge service
    External,
}

impl Provenance {
    /// Section heading used in the rendered context.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Document => "Relevant documents:",
            Self::External => "External knowledge:",
        }
    }
}

/// One item offered to the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    /// Display name or title
    pub title: String,

    /// Optional excerpt shown after the title
    pub detail: Option<String>,
}

impl ContextEntry {
    /// Create an entry with a title only.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: None,
        }
    }

    /// Attach an excerpt to the entry.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// A rendered, labeled section of the context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSection {
    /// Source of the entries in this section
    pub provenance: Provenance,

    /// Rendered text including the heading
    pub text: String,

    /// Number of entries rendered
    pub entries: usize,
}

/// Output of context assembly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledContext {
    /// Sections in priority order (documents before external)
    pub sections: Vec<ContextSection>,

    /// Concatenated section text
    pub context: String,

    /// Query text as embedded in the prompt (truncated only when it alone
    /// exceeds the budget)
    pub query: String,

    /// Final prompt handed to generation
    pub prompt: String,

    /// Document entries dropped to fit the budget
    pub dropped_documents: usize,

    /// External entries dropped to fit the budget
    pub dropped_external: usize,

    /// Whether the query itself had to be shortened
    pub query_truncated: bool,
}

impl AssembledContext {
    /// Characters counted against the budget: context plus query.
    pub fn budgeted_len(&self) -> usize {
        self.context.chars().count() + self.query.chars().count()
    }

    /// Entries that made it into the given section kind.
    pub fn included(&self, provenance: Provenance) -> usize {
        self.sections
            .iter()
            .filter(|s| s.provenance == provenance)
            .map(|s| s.entries)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: query.terse
title: Terse answers
template: "{{context}}Q: {{query}}\nA:"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "query.terse");
        assert_eq!(def.api_version, "1.0");
        assert!(def.template.contains("{{query}}"));
    }

    #[test]
    fn test_default_definition() {
        let def = PromptDefinition::default();
        assert_eq!(def.id, DEFAULT_PROMPT_ID);
        assert_eq!(def.template, DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_provenance_headings_differ() {
        assert_ne!(Provenance::Document.heading(), Provenance::External.heading());
    }
}
