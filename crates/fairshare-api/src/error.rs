use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fairshare_chat::ChatError;
use fairshare_persist::PersistError;
use serde_json::json;
use thiserror::Error;

use crate::mailer::MailError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Email error: {0}")]
    Mail(#[from] MailError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Chat(e) => chat_status(e),
            ApiError::Persist(PersistError::InvalidObjectId(_)) => {
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            ApiError::Persist(PersistError::ThreadNotFound(_)) => {
                (StatusCode::NOT_FOUND, "Chat history not found".to_string())
            }
            ApiError::Persist(e) => {
                tracing::error!("Persistence error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ApiError::Mail(e) => {
                tracing::error!("Email error: {}", e);
                (StatusCode::BAD_GATEWAY, "Failed to send email".to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        }
    }
}

fn chat_status(err: &ChatError) -> (StatusCode, String) {
    match err {
        ChatError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        ChatError::NotFound(_) => (StatusCode::NOT_FOUND, "Chat history not found".to_string()),
        ChatError::Upstream(e) => {
            tracing::error!("Assistant service error: {}", e);
            (StatusCode::BAD_GATEWAY, "Assistant service unavailable".to_string())
        }
        ChatError::RunFailed { status, .. } => {
            tracing::error!("{}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Assistant run ended with status {}", status),
            )
        }
        ChatError::Timeout(_) => (
            StatusCode::GATEWAY_TIMEOUT,
            "Assistant did not respond in time".to_string(),
        ),
        ChatError::Cancelled => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Request was cancelled".to_string(),
        ),
        ChatError::Consistency(msg) => {
            tracing::error!("Consistency error: {}", msg);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal consistency error".to_string())
        }
        ChatError::Store(e) => {
            tracing::error!("Persistence error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        let body = Json(json!({
            "message": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
