//! Structured errors raised by the tool layer itself.
//!
//! Catalogue and cache failures arrive as `storedb_core::Error` and convert on
//! their own; these cover request parameters and output encoding.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., page 0).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Tool output could not be encoded.
    #[error("OUTPUT_FAILED: {0}")]
    OutputFailed(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
            ToolError::OutputFailed(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err: McpError = ToolError::InvalidInput("page must be at least 1".into()).into();
        assert_eq!(err.code.0, -32602);

        let err: McpError = ToolError::OutputFailed("recursion limit".into()).into();
        assert_eq!(err.code.0, -32603);
    }
}
