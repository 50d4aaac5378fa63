use async_trait::async_trait;

use crate::error::Result;
use crate::types::{MessageRole, Run};

/// Run-based conversational assistant service
///
/// A remote thread holds the conversation; a run consumes the thread and,
/// once completed, leaves a new assistant message on it.
#[async_trait]
pub trait AssistantClient: Send + Sync {
    /// Create an empty remote thread and return its id
    async fn create_thread(&self) -> Result<String>;

    /// Delete a remote thread
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    /// Add a message to a remote thread
    async fn post_message(&self, thread_id: &str, role: MessageRole, content: &str) -> Result<()>;

    /// Start a run of the given assistant against a thread, returning the run id
    async fn start_run(&self, thread_id: &str, assistant_id: &str) -> Result<String>;

    /// Fetch the current state of a run
    async fn poll_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Ask the service to stop a run
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<()>;

    /// Text of the newest assistant message produced by `run_id`
    async fn fetch_latest_reply(&self, thread_id: &str, run_id: &str) -> Result<String>;
}
