//! MCP error types.

use thiserror::Error;

/// Errors raised while assembling the tool registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool already registered: {0}")]
    DuplicateTool(String),
}

/// Errors raised by the dispatch shell itself, before any handler runs.
///
/// Handler failures are not errors at this level; they come back as an
/// error-flagged [`CallOutcome`](crate::CallOutcome).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

/// Errors raised while serving the protocol.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("failed to start MCP server: {0}")]
    Initialize(String),

    #[error("MCP server stopped unexpectedly: {0}")]
    Serve(String),
}

pub type Result<T> = std::result::Result<T, Error>;
