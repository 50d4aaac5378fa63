use std::time::Duration;

use fairshare_assistant::{AssistantError, RunStatus};
use fairshare_persist::PersistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Thread not found: {0}")]
    NotFound(String),

    #[error("Assistant service error: {0}")]
    Upstream(#[from] AssistantError),

    #[error("Run {run_id} ended with status {status}{}", reason_suffix(.reason))]
    RunFailed {
        run_id: String,
        status: RunStatus,
        reason: Option<String>,
    },

    #[error("Assistant run did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("Storage error: {0}")]
    Store(PersistError),
}

impl From<PersistError> for ChatError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::ThreadNotFound(id) => ChatError::NotFound(id),
            PersistError::DuplicateKey(key) => {
                ChatError::Consistency(format!("thread {} is already recorded locally", key))
            }
            other => ChatError::Store(other),
        }
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason.as_deref().map(|r| format!(": {}", r)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, ChatError>;
