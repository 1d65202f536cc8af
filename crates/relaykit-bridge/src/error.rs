//! Bridge error types.

use thiserror::Error;

use relaykit_a2a::A2aError;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur while translating between the A2A protocol and
/// the generic stream model
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The underlying agent invocation failed
    #[error("Agent invocation failed: {0}")]
    Invocation(String),

    /// The durable workflow run failed
    #[error("Workflow execution failed: {0}")]
    Workflow(String),

    /// Transport-level failure from the protocol event source
    #[error(transparent)]
    Transport(#[from] A2aError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Create an invocation error
    pub fn invocation(message: impl Into<String>) -> Self {
        Self::Invocation(message.into())
    }

    /// Create a workflow error
    pub fn workflow(message: impl Into<String>) -> Self {
        Self::Workflow(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_conversion() {
        let err: BridgeError = A2aError::connection_error("refused").into();
        assert!(matches!(err, BridgeError::Transport(_)));
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_invocation_display() {
        let err = BridgeError::invocation("rate limited");
        assert_eq!(err.to_string(), "Agent invocation failed: rate limited");
    }
}
