//! Error types for the Terraform Cloud connector.
//!
//! Errors are classified as transient (retryable) or permanent so the request
//! engine can decide whether another attempt is worth making.

use serde::Deserialize;
use thiserror::Error;

/// Result type alias using `TfcError`.
pub type TfcResult<T> = Result<T, TfcError>;

/// Status codes that indicate a caller fault and must never be retried.
pub const NO_RETRY_STATUS_CODES: &[u16] = &[400, 401, 403, 404, 413];

/// A structured sub-error mirrored from the JSON:API error payload.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiErrorDetail {
    /// Status code as a string (e.g. "404"), as the API reports it.
    pub status: Option<String>,
    pub title: Option<String>,
    pub detail: Option<String>,
    #[serde(default)]
    pub source: Option<ApiErrorSource>,
}

/// Pointer into the request document that caused a sub-error.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiErrorSource {
    pub pointer: Option<String>,
}

/// Errors that can occur when interacting with the Terraform Cloud API.
#[derive(Debug, Error)]
pub enum TfcError {
    /// Configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Terraform Cloud API returned a failing status code.
    #[error("API error (status={status}): {message}")]
    Api {
        status: u16,
        message: String,
        /// Structured details parsed from the error body, if any.
        errors: Vec<ApiErrorDetail>,
    },

    /// A list endpoint returned a document whose `data` is not an array.
    /// Indicates a broken endpoint contract, never retried.
    #[error("list endpoint returned non-list data (method={method}, path={path})")]
    MalformedListResponse { method: String, path: String },

    /// Network-level HTTP failure (connect, DNS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error on a successful response.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL construction error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl TfcError {
    /// Check if this error is transient and the request should be retried.
    ///
    /// Transport failures and server-fault status codes are transient; caller
    /// faults (400/401/403/404/413), malformed list shapes, and local errors
    /// are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            TfcError::Api { status, .. } => !NO_RETRY_STATUS_CODES.contains(status),
            TfcError::Http(_) => true,
            TfcError::Config(_)
            | TfcError::MalformedListResponse { .. }
            | TfcError::Json(_)
            | TfcError::Url(_) => false,
        }
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Short code for classification in logs and retry observers.
    pub fn error_code(&self) -> &'static str {
        match self {
            TfcError::Config(_) => "CONFIG",
            TfcError::Api { status, .. } if NO_RETRY_STATUS_CODES.contains(status) => {
                "API_PERMANENT"
            }
            TfcError::Api { .. } => "API_TRANSIENT",
            TfcError::MalformedListResponse { .. } => "MALFORMED_LIST_RESPONSE",
            TfcError::Http(_) => "HTTP",
            TfcError::Json(_) => "JSON",
            TfcError::Url(_) => "URL",
        }
    }

    /// Create an API error from a failing status code and optional error body.
    pub fn api(status: u16, errors: Vec<ApiErrorDetail>) -> Self {
        let message = if NO_RETRY_STATUS_CODES.contains(&status) {
            format!("received response with non-retryable status code {status}")
        } else {
            format!("received response with retryable status code {status}")
        };
        TfcError::Api {
            status,
            message,
            errors,
        }
    }
}
