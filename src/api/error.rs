use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::jar::JarError;
use crate::storage::StorageError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("corrupt index: {0}")]
    CorruptIndex(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::CorruptIndex(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::CorruptIndex(_) => "CORRUPT_INDEX",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JarError> for ApiError {
    fn from(value: JarError) -> Self {
        match value {
            JarError::Backend(_) => ApiError::Internal(value.to_string()),
            JarError::Decode { .. } | JarError::InvalidHeader(_) => {
                ApiError::BadRequest(value.to_string())
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::CorruptIndex { .. } => ApiError::CorruptIndex(value.to_string()),
            StorageError::ReservedKey(_) => ApiError::BadRequest(value.to_string()),
            StorageError::Jar(inner) => inner.into(),
            StorageError::Serialization(_) => ApiError::Internal(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_mapping() {
        let corrupt = serde_json::from_str::<Vec<String>>("nope").unwrap_err();
        let error: ApiError = StorageError::CorruptIndex {
            index_key: "idx".to_string(),
            source: corrupt,
        }
        .into();
        assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error.code(), "CORRUPT_INDEX");

        let error: ApiError = StorageError::ReservedKey("idx".to_string()).into();
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);

        let error: ApiError = StorageError::Jar(JarError::Backend("quota".to_string())).into();
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
