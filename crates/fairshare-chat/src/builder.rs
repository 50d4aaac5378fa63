use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use fairshare_assistant::AssistantClient;
use fairshare_persist::ConversationStore;

use crate::config::ChatConfig;
use crate::orchestrator::ThreadOrchestrator;

/// Builder for constructing a ThreadOrchestrator
pub struct OrchestratorBuilder {
    store: Option<Arc<dyn ConversationStore>>,
    assistant: Option<Arc<dyn AssistantClient>>,
    assistant_id: Option<String>,
    poll_interval: Option<Duration>,
    run_timeout: Option<Duration>,
    cancel_abandoned_runs: Option<bool>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            assistant: None,
            assistant_id: None,
            poll_interval: None,
            run_timeout: None,
            cancel_abandoned_runs: None,
        }
    }

    /// Set the conversation store
    pub fn store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the remote assistant client
    pub fn assistant(mut self, client: Arc<dyn AssistantClient>) -> Self {
        self.assistant = Some(client);
        self
    }

    pub fn assistant_id(mut self, id: impl Into<String>) -> Self {
        self.assistant_id = Some(id.into());
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }

    pub fn cancel_abandoned_runs(mut self, enabled: bool) -> Self {
        self.cancel_abandoned_runs = Some(enabled);
        self
    }

    pub fn build(self) -> Result<ThreadOrchestrator> {
        let store = self.store.ok_or_else(|| anyhow!("Conversation store is required"))?;
        let assistant = self
            .assistant
            .ok_or_else(|| anyhow!("Assistant client is required"))?;
        let assistant_id = self
            .assistant_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| anyhow!("Assistant ID is required"))?;

        let mut config = ChatConfig::new(assistant_id);
        if let Some(interval) = self.poll_interval {
            config = config.with_poll_interval(interval);
        }
        if let Some(timeout) = self.run_timeout {
            if timeout.is_zero() {
                return Err(anyhow!("Run timeout must be greater than zero"));
            }
            config = config.with_run_timeout(timeout);
        }
        if let Some(enabled) = self.cancel_abandoned_runs {
            config = config.with_cancel_abandoned_runs(enabled);
        }

        Ok(ThreadOrchestrator::new(store, assistant, config))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
