use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Deserialize;
use serde::Serialize;
use servicedesk_core::DeskError;
use utoipa::ToSchema;

use crate::validation::ValidationErrors;

/// Error body returned by every failing route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// List of violations for validation failures, a sentence for
    /// rejected transitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

/// Failures surfaced over HTTP.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("invalid request id")]
    InvalidId,

    #[error("API key required")]
    MissingApiKey,

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("request not found")]
    NotFound,

    #[error("{0}")]
    InvalidTransition(String),

    /// Detail is logged, never sent.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors.into_details())
    }
}

impl From<DeskError> for ApiError {
    fn from(err: DeskError) -> Self {
        match err {
            DeskError::NotFound { .. } => Self::NotFound,
            DeskError::InvalidTransition(e) => Self::InvalidTransition(e.to_string()),
            DeskError::Store(e) => Self::Internal(e.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidId => StatusCode::BAD_REQUEST,
            Self::MissingApiKey => StatusCode::UNAUTHORIZED,
            Self::InvalidApiKey => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorResponse {
        let (error, details): (&str, Option<serde_json::Value>) = match self {
            Self::Validation(details) => ("Validation failed", Some(details.into())),
            Self::InvalidId => ("Invalid request ID", None),
            Self::MissingApiKey => ("API key required", None),
            Self::InvalidApiKey => ("Invalid API key", None),
            Self::NotFound => ("Request not found", None),
            Self::InvalidTransition(detail) => ("Invalid status transition", Some(detail.into())),
            Self::Internal(_) => ("Internal server error", None),
        };
        ErrorResponse {
            error: error.to_string(),
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            tracing::error!(error = %detail, "request failed");
        }
        (self.status(), Json(self.body())).into_response()
    }
}
