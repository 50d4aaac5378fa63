pub mod builder;
pub mod config;
pub mod error;
mod locks;
pub mod orchestrator;
pub mod stage;

pub use builder::OrchestratorBuilder;
pub use config::ChatConfig;
pub use error::{ChatError, Result};
pub use orchestrator::ThreadOrchestrator;
pub use stage::SendStage;

// Re-export the types callers need alongside the orchestrator
pub use fairshare_persist::{ChatMessage, MessageRole, ThreadOverview, ThreadStatus};
pub use tokio_util::sync::CancellationToken;
