/*!
 * Error Types
 * Crate-level error with miette diagnostics
 */

use miette::Diagnostic;
use thiserror::Error;

pub use crate::client::{ClientError, ConfigError, TransportError};
pub use crate::permissions::PermissionError;

/// Unified error type
#[derive(Error, Debug, Diagnostic)]
pub enum LmsError {
    #[error("Permission error: {0}")]
    #[diagnostic(transparent)]
    Permission(#[from] PermissionError),

    #[error("Client error: {0}")]
    #[diagnostic(transparent)]
    Client(#[from] ClientError),

    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl From<TransportError> for LmsError {
    fn from(err: TransportError) -> Self {
        LmsError::Client(ClientError::Transport(err))
    }
}

/// Common result type
pub type LmsResult<T> = Result<T, LmsError>;
