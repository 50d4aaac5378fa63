// OpenAI Assistants client implementation

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::wire::{
    CreateMessageBody, CreateRunBody, DeletedObject, MessageList, RunObject, ThreadObject,
};
use crate::config::{AssistantConfig, DEFAULT_BASE_URL};
use crate::error::{AssistantError, Result};
use crate::traits::AssistantClient;
use crate::types::{MessageRole, Run};

const ASSISTANTS_BETA: &str = "assistants=v2";
const REPLY_SCAN_LIMIT: &str = "20";

/// Assistants API client (HTTP direct, no SDK)
#[derive(Debug, Clone)]
pub struct OpenAIAssistantClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIAssistantClient {
    /// Create new client with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        Self::builder()
            .api_key(config.api_key.clone())
            .base_url(config.base_url())
            .request_timeout(config.request_timeout)
            .build()
    }

    pub fn builder() -> OpenAIAssistantClientBuilder {
        OpenAIAssistantClientBuilder::default()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = Self::check(request.send().await?).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| AssistantError::InvalidResponse(e.to_string()))
    }

    /// Turn non-success responses into `AssistantError::Api`
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        let payload = serde_json::from_str::<serde_json::Value>(&error_text).ok();
        let message = payload
            .as_ref()
            .and_then(|p| p.pointer("/error/message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| {
                if error_text.is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    error_text.clone()
                }
            });

        Err(AssistantError::Api {
            status: status.as_u16(),
            message,
            payload,
        })
    }
}

#[async_trait]
impl AssistantClient for OpenAIAssistantClient {
    async fn create_thread(&self) -> Result<String> {
        let thread: ThreadObject = self
            .send_json(
                self.http_client
                    .post(self.url("/threads"))
                    .json(&serde_json::json!({})),
            )
            .await?;

        tracing::debug!(thread_id = %thread.id, "Created remote thread");
        Ok(thread.id)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let deleted: DeletedObject = self
            .send_json(
                self.http_client
                    .delete(self.url(&format!("/threads/{}", thread_id))),
            )
            .await?;

        if !deleted.deleted {
            return Err(AssistantError::InvalidResponse(format!(
                "thread {} was not deleted",
                thread_id
            )));
        }
        Ok(())
    }

    async fn post_message(&self, thread_id: &str, role: MessageRole, content: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.url(&format!("/threads/{}/messages", thread_id)))
            .json(&CreateMessageBody { role, content })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn start_run(&self, thread_id: &str, assistant_id: &str) -> Result<String> {
        let run: RunObject = self
            .send_json(
                self.http_client
                    .post(self.url(&format!("/threads/{}/runs", thread_id)))
                    .json(&CreateRunBody { assistant_id }),
            )
            .await?;

        tracing::debug!(thread_id, run_id = %run.id, status = %run.status, "Started run");
        Ok(run.id)
    }

    async fn poll_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let run: RunObject = self
            .send_json(
                self.http_client
                    .get(self.url(&format!("/threads/{}/runs/{}", thread_id, run_id))),
            )
            .await?;
        Ok(run.into())
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.url(&format!("/threads/{}/runs/{}/cancel", thread_id, run_id)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn fetch_latest_reply(&self, thread_id: &str, run_id: &str) -> Result<String> {
        let messages: MessageList = self
            .send_json(
                self.http_client
                    .get(self.url(&format!("/threads/{}/messages", thread_id)))
                    .query(&[
                        ("order", "desc"),
                        ("limit", REPLY_SCAN_LIMIT),
                        ("run_id", run_id),
                    ]),
            )
            .await?;

        let reply = messages
            .data
            .iter()
            .find(|m| {
                m.role == MessageRole::Assistant && m.run_id.as_deref().map_or(true, |id| id == run_id)
            })
            .map(|m| m.text())
            .unwrap_or_default();

        if reply.trim().is_empty() {
            return Err(AssistantError::EmptyReply {
                run_id: run_id.to_string(),
            });
        }
        Ok(reply)
    }
}

#[derive(Debug, Default)]
pub struct OpenAIAssistantClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    request_timeout: Option<Duration>,
}

impl OpenAIAssistantClientBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Example: "https://api.openai.com/v1"
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<OpenAIAssistantClient> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AssistantError::Config("API key is required".to_string()))?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("OpenAI-Beta", HeaderValue::from_static(ASSISTANTS_BETA));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| AssistantError::Config("Invalid API key format".to_string()))?,
        );

        let mut http_client = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.request_timeout {
            http_client = http_client.timeout(timeout);
        }
        let http_client = http_client
            .build()
            .map_err(|e| AssistantError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(OpenAIAssistantClient {
            http_client,
            base_url,
        })
    }
}
