//! Orchestrator scenarios against in-process adapters.


use crate::{Orchestrator, OrchestratorSettings};
use async_trait::async_trait;
use chrono::Utc;
use localai_core::{AppError, AppResult};
use localai_knowledge::{
    DeleteOutcome, DocumentRepository, EvidenceItem, ExternalKnowledge, ExternalResult,
};
use localai_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage, ModelCatalog};
use localai_prompt::{PromptDefinition, PromptTemplate};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

pub(crate) fn evidence(id: i64, name: &str, snippet: &str) -> EvidenceItem {
    EvidenceItem {
        id,
        display_name: name.to_string(),
        snippet: snippet.to_string(),
        doc_type: ".txt".to_string(),
        size_bytes: snippet.len() as u64,
        created_at: Utc::now(),
    }
}

pub(crate) fn wiki_result(title: &str, extract: &str) -> ExternalResult {
    ExternalResult {
        title: title.to_string(),
        extract: extract.to_string(),
        description: None,
        url: format!("https://en.wikipedia.org/wiki/{}", title),
        thumbnail: None,
        relevance_score: Some(1.0),
    }
}

/// Document repository returning a fixed list, or failing.
#[derive(Default)]
pub(crate) struct FakeDocuments {
    pub items: Vec<EvidenceItem>,
    pub fail: bool,
    pub barrier: Option<Arc<Barrier>>,
    pub calls: AtomicUsize,
    pub last_limit: Mutex<Option<usize>>,
}

#[async_trait]
impl DocumentRepository for FakeDocuments {
    async fn search(&self, _text: &str, limit: usize) -> AppResult<Vec<EvidenceItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_limit.lock().unwrap() = Some(limit);
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if self.fail {
            return Err(AppError::Storage("database is locked".to_string()));
        }
        Ok(self.items.clone())
    }

    async fn list_all(&self) -> AppResult<Vec<EvidenceItem>> {
        Ok(self.items.clone())
    }

    async fn delete_by_id(&self, id: i64) -> AppResult<DeleteOutcome> {
        Ok(DeleteOutcome::Deleted { id })
    }
}

/// External knowledge returning a fixed list, or failing like a dead network.
#[derive(Default)]
pub(crate) struct FakeExternal {
    pub results: Vec<ExternalResult>,
    pub fail: bool,
    pub barrier: Option<Arc<Barrier>>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl ExternalKnowledge for FakeExternal {
    fn source_name(&self) -> &str {
        "fake-wiki"
    }

    async fn search(&self, _text: &str) -> AppResult<Vec<ExternalResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if self.fail {
            return Err(AppError::Knowledge(
                "Failed to reach Wikipedia: connection refused".to_string(),
            ));
        }
        Ok(self.results.clone())
    }
}

/// Generation backend that answers with the model name it was asked for.
#[derive(Default)]
pub(crate) struct FakeLlm {
    pub fail_complete: bool,
    pub unknown_models: Vec<String>,
    pub load_delay: Option<Duration>,
    /// Parks the first completion: one wait on entry, one before answering
    pub complete_gate: Mutex<Option<Arc<Barrier>>>,
    pub requests: Mutex<Vec<LlmRequest>>,
    pub loads: Mutex<Vec<String>>,
    pub active_loads: AtomicUsize,
    pub max_active_loads: AtomicUsize,
}

impl FakeLlm {
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }

    pub fn complete_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for FakeLlm {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn load_model(&self, name: &str) -> AppResult<()> {
        let active = self.active_loads.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_loads.fetch_max(active, Ordering::SeqCst);

        if let Some(delay) = self.load_delay {
            tokio::time::sleep(delay).await;
        }

        self.active_loads.fetch_sub(1, Ordering::SeqCst);
        self.loads.lock().unwrap().push(name.to_string());

        if self.unknown_models.iter().any(|m| m == name) {
            return Err(AppError::Llm(format!(
                "Ollama model load failed (HTTP 404): model '{}' not found",
                name
            )));
        }
        Ok(())
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let gate = self.complete_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.wait().await;
            gate.wait().await;
        }
        if self.fail_complete {
            return Err(AppError::Llm(
                "Ollama generation failed (HTTP 500): out of memory".to_string(),
            ));
        }
        Ok(LlmResponse {
            content: format!("answer from {}", request.model),
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
        })
    }
}

pub(crate) fn default_template() -> PromptTemplate {
    PromptTemplate::compile(&PromptDefinition::default()).unwrap()
}

pub(crate) fn orchestrator(
    documents: Arc<dyn DocumentRepository>,
    external: Arc<dyn ExternalKnowledge>,
    llm: Arc<dyn LlmClient>,
    models_dir: &Path,
    settings: OrchestratorSettings,
) -> Orchestrator {
    Orchestrator::new(
        documents,
        external,
        llm,
        ModelCatalog::new(models_dir, Duration::from_secs(5)),
        default_template(),
        settings,
    )
}
