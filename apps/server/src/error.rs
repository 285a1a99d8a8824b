// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ifc_marker::MarkError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing file in request")]
    MissingFile,

    #[error("Unsupported file '{0}': only .ifc files are accepted")]
    UnsupportedFile(String),

    #[error("File too large: maximum size is {max_mb} MB")]
    FileTooLarge { max_mb: usize },

    #[error("Invalid UTF-8 content")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Could not open IFC file: {0}")]
    InvalidModel(String),

    #[error("Unknown colour: {0}")]
    UnknownColour(String),

    #[error("No elements found with {0}")]
    NoMatches(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Join error")]
    Join(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            ApiError::UnsupportedFile(_) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FILE"),
            ApiError::FileTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE"),
            ApiError::InvalidUtf8(_) => (StatusCode::BAD_REQUEST, "INVALID_UTF8"),
            ApiError::Multipart(_) => (StatusCode::BAD_REQUEST, "MULTIPART_ERROR"),
            ApiError::InvalidModel(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_MODEL"),
            ApiError::UnknownColour(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_COLOUR"),
            ApiError::NoMatches(_) => (StatusCode::UNPROCESSABLE_ENTITY, "NO_MATCHES"),
            ApiError::Processing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PROCESSING_ERROR"),
            ApiError::Cache(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CACHE_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Join(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TASK_ERROR"),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<MarkError> for ApiError {
    fn from(err: MarkError) -> Self {
        match err {
            MarkError::UnknownColour(name) => ApiError::UnknownColour(name),
            MarkError::NoMatches(filter) => ApiError::NoMatches(filter),
            MarkError::Core(e) => ApiError::from(e),
            MarkError::Style(msg) => ApiError::Processing(msg),
        }
    }
}

impl From<ifc_marker_core::Error> for ApiError {
    fn from(err: ifc_marker_core::Error) -> Self {
        match err {
            ifc_marker_core::Error::InvalidFile(msg) => ApiError::InvalidModel(msg),
            other => ApiError::Processing(other.to_string()),
        }
    }
}

impl From<cacache::Error> for ApiError {
    fn from(err: cacache::Error) -> Self {
        ApiError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("JSON error: {}", err))
    }
}
