use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use fairshare_chat::{CancellationToken, ChatMessage, ThreadOverview, ThreadStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::{BulkDeleteRequest, BulkDeleteResponse, MessageResponse};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadResponse {
    pub thread_id: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ThreadStatusRequest {
    /// "active" or "archived"
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreadStatusResponse {
    pub message: String,
    pub thread_id: String,
    pub status: String,
}

/// Create a conversation thread
#[utoipa::path(
    post,
    path = "/api/chat/thread",
    responses(
        (status = 201, description = "Thread created", body = CreateThreadResponse),
        (status = 502, description = "Assistant service unavailable")
    ),
    tag = "chat"
)]
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<CreateThreadResponse>)> {
    let thread_id = state.chat.create_thread().await?;
    Ok((StatusCode::CREATED, Json(CreateThreadResponse { thread_id })))
}

/// Send a user message and wait for the assistant's reply
///
/// The exchange runs on its own task; if the client goes away (or the
/// request deadline fires) the handler future is dropped, which cancels
/// the token and lets the orchestrator cancel the remote run.
#[utoipa::path(
    post,
    path = "/api/chat/message",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Assistant reply", body = MessageResponse),
        (status = 400, description = "Missing thread id or message"),
        (status = 404, description = "Unknown thread"),
        (status = 502, description = "Assistant service unavailable"),
        (status = 504, description = "Assistant did not respond in time")
    ),
    tag = "chat"
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let token = CancellationToken::new();
    let _cancel_on_drop = token.clone().drop_guard();

    let chat = state.chat.clone();
    let task = tokio::spawn(async move {
        chat.send_message_with_cancel(&req.thread_id, &req.message, token)
            .await
    });

    let reply = task
        .await
        .map_err(|e| ApiError::Internal(format!("Chat task failed: {}", e)))??;

    Ok(Json(MessageResponse::new(reply)))
}

/// Full message log of a thread, oldest first
#[utoipa::path(
    get,
    path = "/api/chat/history/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    responses(
        (status = 200, description = "Messages in insertion order"),
        (status = 404, description = "Chat history not found")
    ),
    tag = "chat"
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let messages = state.chat.get_history(&thread_id).await?;
    Ok(Json(messages))
}

/// Every thread, newest first
#[utoipa::path(
    get,
    path = "/api/chat/threads",
    responses(
        (status = 200, description = "Thread overviews; empty list when there are none")
    ),
    tag = "chat"
)]
pub async fn list_threads(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<ThreadOverview>>> {
    Ok(Json(state.chat.list_threads().await?))
}

/// Delete a thread locally and, best-effort, remotely
#[utoipa::path(
    delete,
    path = "/api/chat/admin/threads/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    responses(
        (status = 200, description = "Thread deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Chat history not found")
    ),
    tag = "chat-admin"
)]
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.chat.delete_thread(&thread_id).await?;
    Ok(Json(MessageResponse::new("Thread deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/chat/admin/threads/delete-multiple",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Threads deleted", body = BulkDeleteResponse),
        (status = 400, description = "No thread ids given"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "chat-admin"
)]
pub async fn delete_threads(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    let ids = req.validated("Please provide valid thread IDs")?;
    let deleted = state.chat.delete_threads(&ids).await?;
    Ok(Json(BulkDeleteResponse::new(deleted, "threads")))
}

/// Archive or reactivate a thread
#[utoipa::path(
    put,
    path = "/api/chat/admin/threads/{thread_id}/status",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    request_body = ThreadStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ThreadStatusResponse),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Chat history not found")
    ),
    tag = "chat-admin"
)]
pub async fn set_thread_status(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Json(req): Json<ThreadStatusRequest>,
) -> ApiResult<Json<ThreadStatusResponse>> {
    let status = parse_status(&req.status)?;
    state.chat.set_thread_status(&thread_id, status).await?;

    Ok(Json(ThreadStatusResponse {
        message: "Thread status updated".to_string(),
        thread_id,
        status: req.status.trim().to_lowercase(),
    }))
}

fn parse_status(raw: &str) -> ApiResult<ThreadStatus> {
    match raw.trim().to_lowercase().as_str() {
        "active" => Ok(ThreadStatus::Active),
        "archived" => Ok(ThreadStatus::Archived),
        other => Err(ApiError::BadRequest(format!("Invalid status: {}", other))),
    }
}
