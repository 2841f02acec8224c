//! Error types for the peer directory.

use thiserror::Error;

/// Why a fetch cycle failed. Always surfaced through `FetchState::Failed`,
/// never returned to the caller of `refresh()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not be sent or the connection failed.
    #[error("network error: {0}")]
    Network(String),

    /// The node answered with a non-2xx status.
    #[error("node responded with HTTP {0}")]
    Http(u16),

    /// The body was not a JSON array of strings.
    #[error("malformed peer list: {0}")]
    MalformedPayload(String),

    /// No response within the configured bound.
    #[error("request timed out")]
    Timeout,
}

/// Errors raised while constructing a client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client spawns its fetches on the ambient Tokio runtime.
    #[error("no Tokio runtime available to drive peer fetches")]
    NoRuntime,

    /// The base URL could not be combined with the peers path.
    #[error("invalid node URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Only plain HTTP nodes are supported.
    #[error("unsupported URL scheme '{0}' (expected http)")]
    UnsupportedScheme(String),

    /// A zero timeout would fail every fetch before it is sent.
    #[error("request timeout must be greater than zero")]
    InvalidTimeout,
}
