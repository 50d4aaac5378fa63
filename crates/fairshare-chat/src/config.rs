use std::time::Duration;

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Remote assistant configuration every run is started with
    pub assistant_id: String,
    /// Delay between two run status polls
    pub poll_interval: Duration,
    /// Upper bound on the whole polling phase of one exchange
    pub run_timeout: Duration,
    /// Cancel the remote run when the caller stops waiting for it
    pub cancel_abandoned_runs: bool,
}

impl ChatConfig {
    pub fn new(assistant_id: impl Into<String>) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            poll_interval: Duration::from_secs(1),
            run_timeout: Duration::from_secs(120),
            cancel_abandoned_runs: true,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    pub fn with_cancel_abandoned_runs(mut self, enabled: bool) -> Self {
        self.cancel_abandoned_runs = enabled;
        self
    }
}
