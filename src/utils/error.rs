//! Error types and handling
//!
//! Common error types used across the bridge.

use crate::encoder::EncodeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bridge-wide error type
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid state transition: cannot {action} while {state}")]
    InvalidStateTransition { action: &'static str, state: String },

    #[error("Artifact unavailable: {0}")]
    ArtifactUnavailable(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodeError),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Stable code used on the wire
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::PermissionDenied(_) => "PERMISSION_DENIED",
            BridgeError::InvalidStateTransition { .. } => "INVALID_STATE",
            BridgeError::ArtifactUnavailable(_) => "ARTIFACT_UNAVAILABLE",
            BridgeError::Encoding(_) => "ENCODING_FAILED",
            BridgeError::Device(_) => "DEVICE_ERROR",
            BridgeError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the web content should hear about this failure.
    ///
    /// Denied permissions and guarded transitions stay silent; the rest
    /// would otherwise leave a request without a completion event.
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            BridgeError::ArtifactUnavailable(_) | BridgeError::Encoding(_) | BridgeError::Device(_)
        )
    }
}

/// Failure description delivered to web content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Request kind that failed, as received (e.g. "stop-record")
    pub request: String,
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(request: &str, error: &BridgeError) -> Self {
        ErrorResponse {
            request: request.to_string(),
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using BridgeError
pub type BridgeResult<T> = Result<T, BridgeError>;
