//! Current model state shared by every query of an orchestrator.

use tokio::sync::{Mutex, MutexGuard, RwLock};

/// The active generation model.
///
/// Reads take a consistent snapshot; loads are serialized through a separate
/// lock so a slow backend pull never blocks readers.
#[derive(Debug, Default)]
pub struct CurrentModelState {
    current: RwLock<Option<String>>,
    loads: Mutex<()>,
}

impl CurrentModelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model name at the time of the call, if one has been loaded.
    pub async fn snapshot(&self) -> Option<String> {
        self.current.read().await.clone()
    }

    /// Exclusive right to change the model. Hold it across the backend load.
    pub async fn begin_load(&self) -> MutexGuard<'_, ()> {
        self.loads.lock().await
    }

    /// Publish a successfully loaded model.
    pub async fn set(&self, name: impl Into<String>) {
        *self.current.write().await = Some(name.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_starts_unset() {
        let state = CurrentModelState::new();
        assert_eq!(state.snapshot().await, None);
    }

    #[tokio::test]
    async fn test_set_replaces_value() {
        let state = CurrentModelState::new();
        state.set("llama2").await;
        assert_eq!(state.snapshot().await.as_deref(), Some("llama2"));
        state.set("llama3").await;
        assert_eq!(state.snapshot().await.as_deref(), Some("llama3"));
    }

    #[tokio::test]
    async fn test_reads_not_blocked_by_pending_load() {
        let state = CurrentModelState::new();
        state.set("llama2").await;

        let _load = state.begin_load().await;
        assert_eq!(state.snapshot().await.as_deref(), Some("llama2"));
        assert!(state.loads.try_lock().is_err());
    }
}
