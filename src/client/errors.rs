/*!
 * Client Errors
 * Transport and cached-client error types
 */

use miette::Diagnostic;
use thiserror::Error;

use super::config::ConfigError;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for cached-client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures of the underlying HTTP transport
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum TransportError {
    #[error("Network request failed: {0}")]
    #[diagnostic(
        code(transport::network),
        help("The backend could not be reached. Check connectivity and retry.")
    )]
    Network(String),

    #[error("HTTP {status}: {body}")]
    #[diagnostic(code(transport::status))]
    Status { status: u16, body: String },

    #[error("Response body is not valid JSON: {0}")]
    #[diagnostic(code(transport::decode))]
    Decode(String),

    #[error("Invalid URL: {0}")]
    #[diagnostic(
        code(transport::invalid_url),
        help("Check the configured base URL and the request path.")
    )]
    InvalidUrl(String),
}

impl TransportError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors surfaced by [`CachedClient`](super::CachedClient)
#[derive(Error, Debug, Diagnostic)]
pub enum ClientError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to decode response from {path}: {source}")]
    #[diagnostic(
        code(client::decode),
        help("The payload does not match the requested type.")
    )]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode request body: {0}")]
    #[diagnostic(code(client::encode))]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            ClientError::Decode { .. } | ClientError::Transport(TransportError::Decode(_))
        )
    }
}
