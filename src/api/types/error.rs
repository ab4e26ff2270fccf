//! JSON error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DomainError;

/// Broad class of a failed request, serialized as the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    InvalidRequest,
    NotFound,
    /// A model or search provider failed outside of a run
    Upstream,
    Internal,
}

impl ApiErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Upstream => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "type")]
    pub kind: ApiErrorKind,
    pub message: String,
    /// Request field at fault
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Error)]
#[error("{status}: {message}", message = .body.message)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: kind.status(),
            body: ApiErrorBody {
                kind,
                message: message.into(),
                field: None,
                code: None,
            },
        }
    }

    /// Keep the kind but answer with another status, e.g. 415 for a JSON rejection
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.body.field = Some(field.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.body.code = Some(code.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiErrorResponse { error: self.body }),
        )
            .into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let (kind, code) = match &err {
            DomainError::NotFound { .. } => (ApiErrorKind::NotFound, "not_found"),
            DomainError::Validation { .. } => (ApiErrorKind::InvalidRequest, "validation"),
            DomainError::Provider { .. } => (ApiErrorKind::Upstream, "provider"),
            DomainError::InvalidLabel { .. } => (ApiErrorKind::Upstream, "invalid_label"),
            DomainError::Timeout { .. } => (ApiErrorKind::Upstream, "timeout"),
            DomainError::Configuration { .. } => (ApiErrorKind::Internal, "configuration"),
            DomainError::Internal { .. } => (ApiErrorKind::Internal, "internal"),
        };

        Self::new(kind, err.to_string()).with_code(code)
    }
}
