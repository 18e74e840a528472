//! Tool error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool registered under the requested name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The input payload is missing or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
