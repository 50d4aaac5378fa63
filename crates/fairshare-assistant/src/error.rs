use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Request to assistant service failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success answer from the service. `payload` keeps the parsed JSON
    /// error body when the service sent one.
    #[error("Assistant service returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
        payload: Option<serde_json::Value>,
    },

    #[error("Unexpected assistant response: {0}")]
    InvalidResponse(String),

    #[error("Run {run_id} produced no assistant reply")]
    EmptyReply { run_id: String },

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl AssistantError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AssistantError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AssistantError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Structured error body sent by the service, if any.
    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            AssistantError::Api { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;
