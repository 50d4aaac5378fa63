use std::sync::Arc;

use fairshare_assistant::{AssistantClient, MessageRole as RemoteRole, Run};
use fairshare_persist::{
    ChatMessage, ConversationStore, PersistError, ThreadOverview, ThreadStatus,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::locks::ThreadLocks;
use crate::stage::SendStage;

/// Keeps the local conversation log and the remote assistant thread in step
///
/// Exchanges on the same thread are serialized; different threads proceed in
/// parallel.
pub struct ThreadOrchestrator {
    store: Arc<dyn ConversationStore>,
    assistant: Arc<dyn AssistantClient>,
    config: ChatConfig,
    locks: ThreadLocks,
}

impl ThreadOrchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        assistant: Arc<dyn AssistantClient>,
        config: ChatConfig,
    ) -> Self {
        Self {
            store,
            assistant,
            config,
            locks: ThreadLocks::default(),
        }
    }

    /// Create a builder for fluent construction
    pub fn builder() -> crate::builder::OrchestratorBuilder {
        crate::builder::OrchestratorBuilder::new()
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Create a remote thread, then record it locally under the same id
    pub async fn create_thread(&self) -> Result<String> {
        let thread_id = self.assistant.create_thread().await?;

        match self.store.create_thread(&thread_id).await {
            Ok(_) => {
                info!(thread_id = %thread_id, "Thread created");
                Ok(thread_id)
            }
            Err(PersistError::DuplicateKey(key)) => {
                error!(thread_id = %thread_id, "Remote thread id already exists locally");
                Err(PersistError::DuplicateKey(key).into())
            }
            Err(e) => {
                warn!(thread_id = %thread_id, error = %e, "Local insert failed, removing remote thread");
                if let Err(cleanup) = self.assistant.delete_thread(&thread_id).await {
                    warn!(thread_id = %thread_id, error = %cleanup, "Failed to delete orphaned remote thread");
                }
                Err(e.into())
            }
        }
    }

    /// Send one user message and wait for the assistant's reply
    pub async fn send_message(&self, thread_id: &str, text: &str) -> Result<String> {
        self.send_message_with_cancel(thread_id, text, CancellationToken::new())
            .await
    }

    /// Like [`send_message`](Self::send_message), stopping early once `cancel` fires
    ///
    /// Cancellation is observed while waiting for the thread lock and while
    /// polling. The user message stays in the log whatever happens after it
    /// was appended; no assistant message is written unless a real reply came
    /// back.
    pub async fn send_message_with_cancel(
        &self,
        thread_id: &str,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<String> {
        let mut stage = SendStage::Validating;
        let result = self.exchange(thread_id, text, &cancel, &mut stage).await;

        match &result {
            Ok(reply) => {
                info!(thread_id = %thread_id, reply_len = reply.len(), "Exchange completed");
            }
            Err(e) => {
                warn!(thread_id = %thread_id, stage = %stage, error = %e, "Exchange failed");
            }
        }
        result
    }

    async fn exchange(
        &self,
        thread_id: &str,
        text: &str,
        cancel: &CancellationToken,
        stage: &mut SendStage,
    ) -> Result<String> {
        if text.trim().is_empty() {
            return Err(ChatError::InvalidArgument("Message must not be empty".to_string()));
        }
        if thread_id.trim().is_empty() {
            return Err(ChatError::InvalidArgument("Thread ID is required".to_string()));
        }

        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            guard = self.locks.acquire(thread_id) => guard,
        };

        let thread = self
            .store
            .get_thread(thread_id)
            .await?
            .ok_or_else(|| ChatError::NotFound(thread_id.to_string()))?;
        if thread.is_archived() {
            return Err(ChatError::InvalidArgument(format!(
                "Thread {} is archived",
                thread_id
            )));
        }

        *stage = SendStage::AppendingLocalUser;
        self.store
            .append_message(thread_id, ChatMessage::user(text))
            .await?;

        *stage = SendStage::ForwardingRemote;
        self.assistant
            .post_message(thread_id, RemoteRole::User, text)
            .await?;

        *stage = SendStage::RunStarted;
        let run_id = self
            .assistant
            .start_run(thread_id, &self.config.assistant_id)
            .await?;
        debug!(thread_id = %thread_id, run_id = %run_id, "Run started");

        *stage = SendStage::Polling;
        let run = self.wait_for_run(thread_id, &run_id, cancel).await?;

        *stage = SendStage::RunTerminal;
        if !run.status.is_success() {
            return Err(ChatError::RunFailed {
                run_id,
                status: run.status,
                reason: run.last_error.map(|e| e.message),
            });
        }

        *stage = SendStage::FetchingReply;
        let reply = self.assistant.fetch_latest_reply(thread_id, &run_id).await?;

        *stage = SendStage::AppendingLocalAssistant;
        self.store
            .append_message(thread_id, ChatMessage::assistant(reply.as_str()))
            .await?;

        *stage = SendStage::Done;
        Ok(reply)
    }

    /// Poll until the run is terminal, bounded by the run timeout and `cancel`
    async fn wait_for_run(
        &self,
        thread_id: &str,
        run_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Run> {
        let limit = self.config.run_timeout;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ChatError::Cancelled),
            polled = tokio::time::timeout(limit, self.poll_until_terminal(thread_id, run_id)) => {
                polled.unwrap_or(Err(ChatError::Timeout(limit)))
            }
        };

        if matches!(outcome, Err(ChatError::Cancelled | ChatError::Timeout(_)))
            && self.config.cancel_abandoned_runs
        {
            if let Err(e) = self.assistant.cancel_run(thread_id, run_id).await {
                warn!(thread_id = %thread_id, run_id = %run_id, error = %e, "Failed to cancel abandoned run");
            }
        }
        outcome
    }

    async fn poll_until_terminal(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        loop {
            match self.assistant.poll_run(thread_id, run_id).await {
                Ok(run) if run.status.is_terminal() => {
                    debug!(run_id = %run_id, status = %run.status, "Run finished");
                    return Ok(run);
                }
                Ok(run) => {
                    debug!(run_id = %run_id, status = %run.status, "Run pending");
                }
                Err(e) if e.is_transient() => {
                    warn!(run_id = %run_id, error = %e, "Transient poll failure, polling again");
                }
                Err(e) => return Err(e.into()),
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Messages of a thread in append order
    pub async fn get_history(&self, thread_id: &str) -> Result<Vec<ChatMessage>> {
        let thread = self
            .store
            .get_thread(thread_id)
            .await?
            .ok_or_else(|| ChatError::NotFound(thread_id.to_string()))?;
        Ok(thread.messages)
    }

    /// Thread summaries, newest first; empty when there are none
    pub async fn list_threads(&self) -> Result<Vec<ThreadOverview>> {
        Ok(self.store.list_threads().await?)
    }

    /// Remove a thread locally and, best-effort, remotely
    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let _guard = self.locks.acquire(thread_id).await;

        let deleted = self.store.delete_threads(&[thread_id.to_string()]).await?;
        if deleted == 0 {
            return Err(ChatError::NotFound(thread_id.to_string()));
        }
        info!(thread_id = %thread_id, "Thread deleted");

        if let Err(e) = self.assistant.delete_thread(thread_id).await {
            warn!(thread_id = %thread_id, error = %e, "Failed to delete remote thread");
        }
        Ok(())
    }

    /// Bulk local delete; returns how many threads were removed
    pub async fn delete_threads(&self, thread_ids: &[String]) -> Result<u64> {
        if thread_ids.is_empty() {
            return Err(ChatError::InvalidArgument("No thread IDs provided".to_string()));
        }
        let _guards = self.locks.acquire_many(thread_ids).await;

        let deleted = self.store.delete_threads(thread_ids).await?;
        info!(requested = thread_ids.len(), deleted, "Threads deleted");
        Ok(deleted)
    }

    pub async fn set_thread_status(&self, thread_id: &str, status: ThreadStatus) -> Result<()> {
        let _guard = self.locks.acquire(thread_id).await;
        self.store.set_thread_status(thread_id, status).await?;
        info!(thread_id = %thread_id, status = ?status, "Thread status updated");
        Ok(())
    }
}
