//! Mapping of service errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use qynnovel_storage::StorageError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{0}")]
    NotFound(String),

    #[error("Missing X-User-ID header")]
    MissingIdentity,

    #[error("Invalid X-User-ID header: {0}")]
    InvalidIdentity(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Storage(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Storage(e) if e.is_conflict() => StatusCode::CONFLICT,
            Self::Storage(StorageError::InvalidData { .. }) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MissingIdentity | Self::InvalidIdentity(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use qynnovel_types::{ChapterId, StoryId};

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::from(StorageError::ChapterNotFound {
            id: ChapterId(1),
            source: None,
        });
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let missing_blob = ApiError::from(StorageError::ContentNotFound {
            story_id: StoryId(1),
            chapter_id: ChapterId(1),
            source: None,
        });
        assert_eq!(missing_blob.status(), StatusCode::NOT_FOUND);

        let conflict = ApiError::from(StorageError::DuplicateSlug {
            slug: "taken".to_string(),
            source: None,
        });
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let invalid = ApiError::from(StorageError::invalid("bad"));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let io = ApiError::from(StorageError::ContentOperationFailed {
            operation: "write".to_string(),
            source: None,
        });
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(ApiError::MissingIdentity.status(), StatusCode::BAD_REQUEST);
    }
}
