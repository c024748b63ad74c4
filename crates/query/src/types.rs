//! Query request and result types.

use localai_knowledge::{EvidenceItem, ExternalResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated request for an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Question text; must not be blank
    pub text: String,

    /// Search uploaded documents for evidence
    #[serde(default = "default_true")]
    pub include_documents: bool,

    /// Search the external knowledge service
    #[serde(default)]
    pub include_external_knowledge: bool,

    /// Model the caller expects; generation always uses the loaded model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,

    /// Upper bound on document evidence items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sources: Option<usize>,
}

fn default_true() -> bool {
    true
}

impl Query {
    /// Query over documents only.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            include_documents: true,
            include_external_knowledge: false,
            model_name: None,
            max_sources: None,
        }
    }

    pub fn with_documents(mut self, include: bool) -> Self {
        self.include_documents = include;
        self
    }

    pub fn with_external_knowledge(mut self, include: bool) -> Self {
        self.include_external_knowledge = include;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_name = Some(model.into());
        self
    }

    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = Some(max_sources);
        self
    }
}

/// Evidence that made it into the prompt, in prompt order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySources {
    pub documents: Vec<EvidenceItem>,
    pub external: Vec<ExternalResult>,
}

/// A non-fatal condition met while answering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryWarning {
    /// Document search failed; answered without document evidence
    EvidenceDegraded { reason: String },

    /// External knowledge search failed; answered without it
    ExternalDegraded { reason: String },

    /// Evidence entries were dropped to fit the context budget
    ContextTruncated {
        dropped_documents: usize,
        dropped_external: usize,
    },

    /// The query alone exceeded the context budget and was shortened
    QueryTruncated { original_chars: usize, budget: usize },
}

impl fmt::Display for QueryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EvidenceDegraded { reason } => {
                write!(f, "document search unavailable: {}", reason)
            }
            Self::ExternalDegraded { reason } => {
                write!(f, "external knowledge unavailable: {}", reason)
            }
            Self::ContextTruncated {
                dropped_documents,
                dropped_external,
            } => write!(
                f,
                "context budget reached: left out {} documents and {} external results",
                dropped_documents, dropped_external
            ),
            Self::QueryTruncated {
                original_chars,
                budget,
            } => write!(
                f,
                "query of {} characters shortened to fit the {} character budget",
                original_chars, budget
            ),
        }
    }
}

/// An answered query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Generated answer text
    pub response: String,

    /// Attributed sources
    pub sources: QuerySources,

    /// Model that produced the answer
    pub model_used: String,

    /// Wall-clock time from acceptance to result
    pub processing_time_seconds: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<QueryWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder_defaults() {
        let query = Query::new("capital of France");
        assert!(query.include_documents);
        assert!(!query.include_external_knowledge);
        assert_eq!(query.model_name, None);
        assert_eq!(query.max_sources, None);

        let query = query
            .with_documents(false)
            .with_external_knowledge(true)
            .with_model("llama3")
            .with_max_sources(2);
        assert!(!query.include_documents);
        assert!(query.include_external_knowledge);
        assert_eq!(query.model_name.as_deref(), Some("llama3"));
        assert_eq!(query.max_sources, Some(2));
    }

    #[test]
    fn test_query_deserialize_defaults() {
        let query: Query = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(query, Query::new("hi"));
    }

    #[test]
    fn test_empty_warnings_omitted() {
        let result = QueryResult {
            response: "Paris.".to_string(),
            sources: QuerySources::default(),
            model_used: "llama2".to_string(),
            processing_time_seconds: 0.5,
            warnings: Vec::new(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("warnings").is_none());
        assert_eq!(json["model_used"], "llama2");
        assert_eq!(json["sources"]["external"], serde_json::json!([]));
    }

    #[test]
    fn test_warning_serialization() {
        let warning = QueryWarning::ExternalDegraded {
            reason: "timeout".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "external_degraded");
        assert_eq!(json["reason"], "timeout");
    }
}
