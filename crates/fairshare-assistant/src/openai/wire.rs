// Assistants v2 payloads
// https://platform.openai.com/docs/api-reference/assistants

use serde::{Deserialize, Serialize};

use crate::types::{MessageRole, Run, RunError, RunStatus};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ThreadObject {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeletedObject {
    #[allow(dead_code)]
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateMessageBody<'a> {
    pub role: MessageRole,
    pub content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateRunBody<'a> {
    pub assistant_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RunObject {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

impl From<RunObject> for Run {
    fn from(run: RunObject) -> Self {
        Self {
            id: run.id,
            status: run.status,
            last_error: run.last_error,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageList {
    pub data: Vec<MessageObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageObject {
    pub role: MessageRole,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

impl MessageObject {
    /// Text parts joined with blank lines; images and other parts are skipped
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.value.as_str()),
                ContentPart::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ContentPart {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TextValue {
    pub value: String,
}
