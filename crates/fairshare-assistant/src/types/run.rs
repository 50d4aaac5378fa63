use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a remote run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Cancelling,
    Incomplete,
    RequiresAction,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// The run will not change state anymore.
    ///
    /// `RequiresAction` counts as terminal: the run waits for tool outputs
    /// that this client never supplies, so it can only expire.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Expired
                | RunStatus::Incomplete
                | RunStatus::RequiresAction
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Incomplete => "incomplete",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error the service attached to a failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

/// Snapshot of a remote run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

impl Run {
    pub fn new(id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            id: id.into(),
            status,
            last_error: None,
        }
    }

    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.last_error = Some(RunError {
            code: code.into(),
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        for status in [
            RunStatus::Completed,
            RunStatus::Failed,
            RunStatus::Cancelled,
            RunStatus::Expired,
            RunStatus::Incomplete,
            RunStatus::RequiresAction,
        ] {
            assert!(status.is_terminal(), "{status} should be terminal");
        }
        for status in [
            RunStatus::Queued,
            RunStatus::InProgress,
            RunStatus::Cancelling,
            RunStatus::Unknown,
        ] {
            assert!(!status.is_terminal(), "{status} should not be terminal");
        }
    }

    #[test]
    fn test_only_completed_is_success() {
        assert!(RunStatus::Completed.is_success());
        assert!(!RunStatus::Failed.is_success());
        assert!(!RunStatus::RequiresAction.is_success());
    }

    #[test]
    fn test_unrecognized_status_deserializes_as_unknown() {
        let status: RunStatus = serde_json::from_str("\"paused_for_review\"").unwrap();
        assert_eq!(status, RunStatus::Unknown);

        let status: RunStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, RunStatus::InProgress);
    }
}
