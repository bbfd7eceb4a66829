//! Error handling module for the glazing backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::StoreError;
use crate::intake::WizardError;
use crate::notify::DeliveryError;
use crate::reviews::ReviewError;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const STORE_ERROR: &str = "STORE_ERROR";
    pub const DELIVERY_ERROR: &str = "DELIVERY_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found
    #[error("{0}")]
    NotFound(String),
    /// Validation error, optionally scoped to fields
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },
    /// Request conflicts with work already in flight
    #[error("{0}")]
    Conflict(String),
    /// Persistence error
    #[error("{0}")]
    Store(String),
    /// Outbound notification failed
    #[error("{0}")]
    Delivery(String),
    /// Internal server error
    #[error("{0}")]
    Internal(String),
    /// Bad request
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Delivery(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation { .. } => codes::VALIDATION_ERROR,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::Store(_) => codes::STORE_ERROR,
            AppError::Delivery(_) => codes::DELIVERY_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Store error: {:?}", err);
        AppError::Store(format!("Store error: {}", err))
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::Validation(v) => AppError::Validation {
                details: Some(serde_json::json!({ "field": v.field })),
                message: v.message,
            },
            ReviewError::Persistence(e) => {
                tracing::error!("Review persistence error: {:?}", e);
                AppError::Store("Failed to save review".to_string())
            }
        }
    }
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::Validation(errors) => AppError::Validation {
                message: "Please correct the highlighted fields".to_string(),
                details: Some(serde_json::json!({ "fields": errors })),
            },
            WizardError::UnknownField(_) | WizardError::WrongKind { .. } => {
                AppError::BadRequest(err.to_string())
            }
            WizardError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
        }
    }
}

impl From<DeliveryError> for AppError {
    fn from(err: DeliveryError) -> Self {
        tracing::error!("Delivery error: {:?}", err);
        AppError::Delivery(format!("Failed to send email: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::Validation { details, .. } => details.clone(),
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
