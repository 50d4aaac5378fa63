pub mod message;
pub mod run;

pub use message::MessageRole;
pub use run::{Run, RunError, RunStatus};
