//! Catalogue API client error types.

use std::sync::Arc;

use storedb_core::Error;

/// Errors from the remote catalogue client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogueError {
    /// Request rejected before it was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configured base URL cannot carry path segments.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The catalogue answered 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for CatalogueError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { CatalogueError::Timeout } else { CatalogueError::Network(Arc::new(err)) }
    }
}

impl From<CatalogueError> for Error {
    fn from(err: CatalogueError) -> Self {
        match err {
            CatalogueError::InvalidRequest(msg) => Error::InvalidInput(msg),
            CatalogueError::InvalidBaseUrl(url) => Error::Config(format!("invalid base URL: {url}")),
            CatalogueError::NotFound(path) => Error::NotFound(path),
            CatalogueError::Parse(msg) => Error::Decode(msg),
            other @ (CatalogueError::HttpError { .. } | CatalogueError::Timeout | CatalogueError::Network(_)) => {
                Error::Network(other.to_string())
            }
        }
    }
}
