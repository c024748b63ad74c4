//! The query pipeline.
//!
//! Each query runs `received -> gathering -> assembling -> generating`.
//! Document and external searches run concurrently and are best-effort: a
//! failing source contributes nothing and adds a warning. Generation is
//! mandatory; without a loaded model, or when the backend fails, the query
//! fails with no partial result.

use crate::error::OrchestratorError;
use crate::state::CurrentModelState;
use crate::types::{Query, QueryResult, QuerySources, QueryWarning};
use localai_core::{AppConfig, AppError, AppResult};
use localai_knowledge::{
    DocumentRepository, EvidenceItem, ExternalKnowledge, ExternalResult, SqliteDocumentStore,
    WikipediaClient,
};
use localai_llm::{create_client, LlmClient, LlmRequest, ModelCatalog, ModelFile, ProviderType};
use localai_prompt::types::DEFAULT_PROMPT_ID;
use localai_prompt::{assemble, load_prompt_or_default, ContextEntry, PromptTemplate, Provenance};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tunables applied to every query.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Character budget for context plus query
    pub context_budget: usize,

    /// Document evidence limit when the query sets none
    pub max_sources: usize,

    /// Sampling temperature passed to the backend
    pub temperature: Option<f32>,

    /// Cap on generated tokens passed to the backend
    pub max_tokens: Option<u32>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            context_budget: 4000,
            max_sources: 5,
            temperature: None,
            max_tokens: None,
        }
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            context_budget: config.context_budget,
            max_sources: config.max_sources,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Answers queries and owns the current model.
pub struct Orchestrator {
    documents: Arc<dyn DocumentRepository>,
    external: Arc<dyn ExternalKnowledge>,
    llm: Arc<dyn LlmClient>,
    catalog: ModelCatalog,
    template: PromptTemplate,
    settings: OrchestratorSettings,
    model: CurrentModelState,
}

impl Orchestrator {
    /// Assemble an orchestrator from its collaborators. No model is loaded.
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        external: Arc<dyn ExternalKnowledge>,
        llm: Arc<dyn LlmClient>,
        catalog: ModelCatalog,
        template: PromptTemplate,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            documents,
            external,
            llm,
            catalog,
            template,
            settings,
            model: CurrentModelState::new(),
        }
    }

    /// Wire the default adapters described by the configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let store = SqliteDocumentStore::open(&config.database_file(), &config.uploads_dir())?;
        let wiki = WikipediaClient::with_options(&config.wiki_api_url, config.wiki_results, timeout);
        let llm = create_client(ProviderType::Ollama.as_str(), Some(&config.ollama_url), timeout)?;
        let catalog = ModelCatalog::new(config.models_dir(), timeout);

        let definition = load_prompt_or_default(&config.workspace, DEFAULT_PROMPT_ID)?;
        let template = PromptTemplate::compile(&definition)?;

        Ok(Self::new(
            Arc::new(store),
            Arc::new(wiki),
            llm,
            catalog,
            template,
            OrchestratorSettings::from_config(config),
        ))
    }

    /// Answer a query.
    pub async fn handle_query(&self, query: &Query) -> Result<QueryResult, OrchestratorError> {
        let started = Instant::now();

        let text = query.text.trim();
        if text.is_empty() {
            return Err(OrchestratorError::InvalidQuery(
                "query text is empty".to_string(),
            ));
        }
        if query.max_sources == Some(0) {
            return Err(OrchestratorError::InvalidQuery(
                "max_sources must be at least 1".to_string(),
            ));
        }

        tracing::info!(
            "Handling query ({} chars, documents: {}, external: {})",
            text.chars().count(),
            query.include_documents,
            query.include_external_knowledge
        );

        let mut warnings = Vec::new();
        let (mut documents, mut external) = self.gather(query, text, &mut warnings).await;

        let doc_entries: Vec<ContextEntry> = documents.iter().map(document_entry).collect();
        let ext_entries: Vec<ContextEntry> = external.iter().map(external_entry).collect();

        let budget = self.settings.context_budget;
        let assembled = assemble(&self.template, text, &doc_entries, &ext_entries, budget)
            .map_err(OrchestratorError::GenerationFailed)?;

        if assembled.query_truncated {
            warnings.push(QueryWarning::QueryTruncated {
                original_chars: text.chars().count(),
                budget,
            });
        } else if assembled.dropped_documents + assembled.dropped_external > 0 {
            warnings.push(QueryWarning::ContextTruncated {
                dropped_documents: assembled.dropped_documents,
                dropped_external: assembled.dropped_external,
            });
        }

        // Sources report only what the prompt actually contains
        documents.truncate(assembled.included(Provenance::Document));
        external.truncate(assembled.included(Provenance::External));

        let model = self
            .model
            .snapshot()
            .await
            .ok_or(OrchestratorError::NoModelLoaded)?;

        if let Some(requested) = query.model_name.as_deref() {
            if requested != model {
                tracing::debug!(
                    "Query asked for model '{}'; generating with loaded model '{}'",
                    requested,
                    model
                );
            }
        }

        let mut request = LlmRequest::new(assembled.prompt, model.as_str());
        if let Some(temperature) = self.settings.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.settings.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.llm.complete(&request).await.map_err(|e| {
            tracing::warn!("Generation with '{}' failed: {}", model, e);
            OrchestratorError::GenerationFailed(e)
        })?;

        tracing::debug!(
            "Backend reported model '{}', {} prompt and {} completion tokens",
            response.model,
            response.usage.prompt_tokens,
            response.usage.completion_tokens
        );

        let elapsed = started.elapsed().as_secs_f64();
        tracing::info!(
            "Answered with '{}' in {:.2}s ({} documents, {} external, {} warnings)",
            model,
            elapsed,
            documents.len(),
            external.len(),
            warnings.len()
        );

        Ok(QueryResult {
            response: response.content,
            sources: QuerySources {
                documents,
                external,
            },
            model_used: model,
            processing_time_seconds: elapsed,
            warnings,
        })
    }

    /// Run the enabled searches concurrently; failures become warnings.
    async fn gather(
        &self,
        query: &Query,
        text: &str,
        warnings: &mut Vec<QueryWarning>,
    ) -> (Vec<EvidenceItem>, Vec<ExternalResult>) {
        let limit = query.max_sources.unwrap_or(self.settings.max_sources);

        let document_search = async {
            if query.include_documents {
                Some(self.documents.search(text, limit).await)
            } else {
                None
            }
        };
        let external_search = async {
            if query.include_external_knowledge {
                Some(self.external.search(text).await)
            } else {
                None
            }
        };

        let (documents, external) = tokio::join!(document_search, external_search);

        let documents = match documents {
            Some(Ok(mut items)) => {
                items.truncate(limit);
                items
            }
            Some(Err(e)) => {
                tracing::warn!("Document search failed, continuing without documents: {}", e);
                warnings.push(QueryWarning::EvidenceDegraded {
                    reason: e.to_string(),
                });
                Vec::new()
            }
            None => Vec::new(),
        };

        let external = match external {
            Some(Ok(results)) => results,
            Some(Err(e)) => {
                tracing::warn!(
                    "{} search failed, continuing without it: {}",
                    self.external.source_name(),
                    e
                );
                warnings.push(QueryWarning::ExternalDegraded {
                    reason: e.to_string(),
                });
                Vec::new()
            }
            None => Vec::new(),
        };

        tracing::debug!(
            "Gathered {} documents and {} external results",
            documents.len(),
            external.len()
        );

        (documents, external)
    }

    /// Load a model on the backend and make it current.
    ///
    /// Loads are serialized. A failed load leaves the current model as it was;
    /// queries already generating keep the model they started with.
    pub async fn load_model(&self, name: &str) -> AppResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Llm("Model name cannot be empty".to_string()));
        }

        let _load = self.model.begin_load().await;
        self.llm.load_model(name).await?;
        self.model.set(name).await;

        tracing::info!("Current model is now '{}'", name);
        Ok(())
    }

    /// Name of the current model, if any load has succeeded.
    pub async fn current_model(&self) -> Option<String> {
        self.model.snapshot().await
    }

    pub fn list_models(&self) -> AppResult<Vec<ModelFile>> {
        self.catalog.list()
    }

    pub async fn download_model(&self, name: &str, url: &str) -> AppResult<ModelFile> {
        self.catalog.download(name, url).await
    }

    /// Delete a model file from the catalog.
    ///
    /// The current model is left as is; the backend owns what it has loaded.
    pub fn delete_model(&self, name: &str) -> AppResult<()> {
        self.catalog.delete(name)
    }

    /// The document repository queries search.
    pub fn documents(&self) -> &Arc<dyn DocumentRepository> {
        &self.documents
    }
}

fn document_entry(item: &EvidenceItem) -> ContextEntry {
    ContextEntry::new(item.display_name.as_str()).with_detail(item.snippet.as_str())
}

fn external_entry(result: &ExternalResult) -> ContextEntry {
    ContextEntry::new(result.title.as_str()).with_detail(result.extract.as_str())
}
