//! Unified error types for storedb.
//!
//! Fetch failures are captured on cache entries and cloned out to every reader,
//! so every variant carries owned text and the type is `Clone`.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Unified error type shared by the cache, the catalogue service and the tools.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Transport failure, timeout or non-success HTTP status.
    #[error("NETWORK_FAILURE: {0}")]
    Network(String),

    /// Response body did not have the expected shape.
    #[error("DECODE_FAILURE: {0}")]
    Decode(String),

    /// The remote catalogue has no such record.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Invalid input parameters (e.g., empty category slug).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or failed validation.
    #[error("CONFIG_ERROR: {0}")]
    Config(String),
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl Error {
    /// Whether users should see this as "could not reach the catalogue".
    ///
    /// Decode failures count as network failures for display purposes.
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Decode(_))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::Network(msg) => (-32008, msg.clone()),
            Error::Decode(msg) => (-32009, msg.clone()),
            Error::NotFound(msg) => (-32001, msg.clone()),
            Error::Config(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
