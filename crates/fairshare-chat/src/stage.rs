use std::fmt;

/// Progress of one send-message exchange
///
/// ```text
/// Validating -> AppendingLocalUser -> ForwardingRemote -> RunStarted -> Polling
///   -> RunTerminal -> FetchingReply -> AppendingLocalAssistant -> Done
/// ```
///
/// A failed exchange reports the stage it was in when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStage {
    Validating,
    AppendingLocalUser,
    ForwardingRemote,
    RunStarted,
    Polling,
    RunTerminal,
    FetchingReply,
    AppendingLocalAssistant,
    Done,
}

impl SendStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendStage::Validating => "validating",
            SendStage::AppendingLocalUser => "appending_local_user",
            SendStage::ForwardingRemote => "forwarding_remote",
            SendStage::RunStarted => "run_started",
            SendStage::Polling => "polling",
            SendStage::RunTerminal => "run_terminal",
            SendStage::FetchingReply => "fetching_reply",
            SendStage::AppendingLocalAssistant => "appending_local_assistant",
            SendStage::Done => "done",
        }
    }
}

impl fmt::Display for SendStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
