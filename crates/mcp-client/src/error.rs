//! Error taxonomy for the stdio protocol client.

use serde_json::Value;
use thiserror::Error;

/// Failures surfaced by the transport, the session, and the normalizer.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server executable could not be launched.
    #[error("failed to start `{command}`: {source}")]
    StartFailure {
        command: String,
        source: std::io::Error,
    },

    /// Child stdin is gone or a write to it failed.
    #[error("transport closed: {reason}")]
    TransportClosed { reason: String },

    /// Child stdout reached end-of-stream. Carries the captured stderr tail.
    #[error("server closed stdout. stderr: {stderr}")]
    StreamClosed { stderr: String },

    /// The `initialize` request was rejected.
    #[error("handshake failed: {error}")]
    HandshakeFailure { error: Value },

    /// The server answered a request with a JSON-RPC error object.
    #[error("JSON-RPC error for {method}: {error}")]
    RemoteError { method: String, error: Value },

    /// A tool result carried no content entry that could be normalized.
    #[error("no usable content entry in: {payload}")]
    UnusableResult { payload: Value },

    /// An outgoing envelope could not be serialized.
    #[error("failed to encode {method} request: {source}")]
    Encode {
        method: String,
        source: serde_json::Error,
    },
}

impl ClientError {
    /// Message text of a remote error, falling back to the full display form.
    ///
    /// Case assertions match on this text, so it prefers the JSON-RPC
    /// `error.message` string when one is present.
    pub fn remote_message(&self) -> String {
        match self {
            Self::RemoteError { error, .. } | Self::HandshakeFailure { error } => error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string()),
            other => other.to_string(),
        }
    }

    /// True for failures that mean the child can no longer be talked to.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::StartFailure { .. } | Self::TransportClosed { .. } | Self::StreamClosed { .. }
        )
    }
}
