//! Error types for the image upload server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::addressor::IdentifierError;
use crate::gateway::GatewayError;

/// Body returned for every failed request
pub const APOLOGY: &str = "Sorry, something bugged out!";

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("No image field in upload")]
    InputMissing,

    #[error("Invalid content identifier {value}: {source}")]
    InvalidIdentifier {
        value: String,
        #[source]
        source: IdentifierError,
    },

    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("S3 SDK error: {0}")]
    SdkError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InputMissing => StatusCode::BAD_REQUEST,
            AppError::InvalidIdentifier { .. } => StatusCode::NOT_FOUND,
            AppError::Multipart(e) => e.status(),
            AppError::Gateway(e) => match e {
                GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
                GatewayError::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                GatewayError::StorageWriteFailed { .. }
                | GatewayError::StorageVisibilityFailed { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::Gateway(e) if status.is_server_error() => {
                tracing::error!(
                    content_id = %e.content_id(),
                    kind = e.kind(),
                    error = %self,
                    "Storage failure"
                );
            }
            _ => {
                tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
            }
        }

        (status, APOLOGY).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressor::{identify, ContentIdentifier};

    #[test]
    fn test_status_codes() {
        let id = identify(b"hello");

        assert_eq!(AppError::InputMissing.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(GatewayError::NotFound(id.clone())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(GatewayError::StorageUnavailable {
                id: id.clone(),
                source: StorageError::SdkError("timeout".to_string()),
            })
            .status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(GatewayError::StorageVisibilityFailed {
                id,
                source: StorageError::AccessDenied("acl".to_string()),
            })
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let source = ContentIdentifier::parse("nope").unwrap_err();
        assert_eq!(
            AppError::InvalidIdentifier {
                value: "nope".to_string(),
                source,
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_response_body_is_apology() {
        let response = AppError::InputMissing.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/plain; charset=utf-8"
        );
    }
}
