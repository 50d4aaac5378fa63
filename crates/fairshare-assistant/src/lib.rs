pub mod config;
pub mod error;
pub mod openai;
pub mod traits;
pub mod types;

pub use config::AssistantConfig;
pub use error::{AssistantError, Result};
pub use openai::{OpenAIAssistantClient, OpenAIAssistantClientBuilder};
pub use traits::AssistantClient;
pub use types::{MessageRole, Run, RunError, RunStatus};
