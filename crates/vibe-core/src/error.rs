//! Error types for the Vibe synchronization layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire synchronization layer.
///
/// Errors are `Clone` so that a single failed fetch can be delivered to every
/// caller attached to it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncError {
    /// Network unreachable, timeout, or an undecodable body
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// HTTP 401 or an expired session
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Business validation failure (4xx other than 401)
    #[error("{detail}")]
    Validation { status: u16, detail: String },

    /// Server failure (5xx or an unexpected status)
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// A disabled query was awaited
    #[error("Query disabled: {key}")]
    Disabled { key: String },

    /// A cached value was read back with a different type
    #[error("Cached value type mismatch for key {key}")]
    TypeMismatch { key: String },

    /// The fetch was aborted by a cache clear, purge or eviction
    #[error("Request cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error body returned by the remote API on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl SyncError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Maps a non-2xx response to an error.
    ///
    /// The `detail` field of a JSON body is passed through verbatim. When the
    /// body carries no `detail`, the raw text is used, falling back to the
    /// status code.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = Self::extract_detail(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {}", status)
            } else {
                trimmed.to_string()
            }
        });

        match status {
            401 => Self::Unauthorized { message },
            400..=499 => Self::Validation {
                status,
                detail: message,
            },
            _ => Self::Server { status, message },
        }
    }

    fn extract_detail(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        match parsed.detail {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            // FastAPI validation errors carry a list of objects
            other => Some(other.to_string()),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this error must force the session into `Unauthenticated`
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Check if this is a transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the message suitable for showing to an operator.
    ///
    /// Validation failures surface the server's `detail` unchanged.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { detail, .. } => detail.clone(),
            Self::Transport { message }
            | Self::Unauthorized { message }
            | Self::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        Self::Config(format!("{} (kind: {:?})", err, err.kind()))
    }
}

/// A type alias for `Result<T, SyncError>`.
pub type Result<T> = std::result::Result<T, SyncError>;
