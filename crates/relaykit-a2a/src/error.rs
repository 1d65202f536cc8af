//! A2A Protocol Error Types

use thiserror::Error;

/// Result type for A2A operations
pub type A2aResult<T> = Result<T, A2aError>;

/// Errors that can occur in A2A protocol operations
#[derive(Debug, Error)]
pub enum A2aError {
    /// Task not found
    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    /// Message validation failed
    #[error("Invalid message: {reason}")]
    InvalidMessage { reason: String },

    /// Connection error
    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    /// Protocol error
    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL parsing error (when client feature is enabled)
    #[cfg(feature = "client")]
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// HTTP error (when client feature is enabled)
    #[cfg(feature = "client")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl A2aError {
    /// Create a task not found error
    pub fn task_not_found(task_id: impl Into<String>) -> Self {
        Self::TaskNotFound {
            task_id: task_id.into(),
        }
    }

    /// Create an invalid message error
    pub fn invalid_message(reason: impl Into<String>) -> Self {
        Self::InvalidMessage {
            reason: reason.into(),
        }
    }

    /// Create a connection error
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol_error(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, A2aError::ConnectionError { .. })
    }
}

/// A2A protocol error payload (JSON-RPC style)
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<A2aError> for ErrorResponse {
    fn from(err: A2aError) -> Self {
        // JSON-RPC reserved codes plus the A2A task-not-found extension.
        let code = match &err {
            A2aError::TaskNotFound { .. } => -32001,
            A2aError::InvalidMessage { .. } => -32600,
            A2aError::SerializationError(_) => -32700,
            A2aError::ProtocolError { .. } => -32600,
            _ => -32603,
        };

        ErrorResponse::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = A2aError::task_not_found("task-123");
        assert!(matches!(err, A2aError::TaskNotFound { .. }));
        assert_eq!(err.to_string(), "Task not found: task-123");
    }

    #[test]
    fn test_error_retryable() {
        let connection_err = A2aError::connection_error("connection refused");
        assert!(connection_err.is_retryable());

        let not_found = A2aError::task_not_found("task-123");
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_error_response_conversion() {
        let err = A2aError::task_not_found("task-123");
        let response: ErrorResponse = err.into();

        assert_eq!(response.code, -32001);
        assert!(response.message.contains("task-123"));
    }
}
