pub mod blogs;
pub mod chat;
pub mod contact;
pub mod health;

use fairshare_persist::PersistError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Vec<String>,
}

impl BulkDeleteRequest {
    /// Reject an empty list or blank ids with `message`
    pub fn validated(self, message: &str) -> ApiResult<Vec<String>> {
        if self.ids.is_empty() || self.ids.iter().any(|id| id.trim().is_empty()) {
            return Err(ApiError::BadRequest(message.to_string()));
        }
        Ok(self.ids)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    pub message: String,
    pub deleted_count: u64,
}

impl BulkDeleteResponse {
    pub fn new(deleted_count: u64, noun: &str) -> Self {
        Self {
            message: format!("{} {} deleted successfully", deleted_count, noun),
            deleted_count,
        }
    }
}

/// A missing record and a malformed id both read as "not found"
pub(crate) fn found<T>(result: fairshare_persist::Result<Option<T>>, what: &str) -> ApiResult<T> {
    match result {
        Ok(Some(value)) => Ok(value),
        Ok(None) | Err(PersistError::InvalidObjectId(_)) => {
            Err(ApiError::NotFound(format!("{} not found", what)))
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn removed(result: fairshare_persist::Result<bool>, what: &str) -> ApiResult<()> {
    match result {
        Ok(true) => Ok(()),
        Ok(false) | Err(PersistError::InvalidObjectId(_)) => {
            Err(ApiError::NotFound(format!("{} not found", what)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Trimmed, non-empty text or `None`
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
