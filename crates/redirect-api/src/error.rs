//! Mapping of request and registry failures onto HTTP responses.
//!
//! Storage and configuration detail stays in the logs; clients only see a
//! generic message for those.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use redirect_registry::RegistryError;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Required parameter {0} is missing")]
    MissingParameter(&'static str),

    #[error("Resource {0} not found")]
    UnknownResource(String),

    /// A stored address that cannot be sent as a `Location` header.
    #[error("stored address for {0} is not a valid redirect location")]
    InvalidLocation(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) => StatusCode::BAD_REQUEST,
            Self::UnknownResource(_) => StatusCode::NOT_FOUND,
            Self::InvalidLocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Registry(e) => match e {
                RegistryError::EmptyField(_)
                | RegistryError::InvalidAddress(_)
                | RegistryError::InvalidAlias(_) => StatusCode::BAD_REQUEST,
                RegistryError::FoundryNotFound(_) | RegistryError::PublicIdNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                RegistryError::AliasUnavailable(_) => StatusCode::NOT_ACCEPTABLE,
                RegistryError::Conflict(_) => StatusCode::CONFLICT,
                RegistryError::Ambiguous { .. }
                | RegistryError::AllocationExhausted { .. }
                | RegistryError::Storage(_)
                | RegistryError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message safe to return to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Registry(RegistryError::Storage(_)) => "internal storage error".to_string(),
            Self::Registry(RegistryError::Config(_)) => "internal configuration error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        } else {
            warn!(%status, error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
