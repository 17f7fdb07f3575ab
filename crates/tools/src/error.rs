//! Tool handler error types.

use mcp::ArgumentError;
use thiserror::Error;

/// Every way a tool invocation can fail.
///
/// The `Display` text is what the MCP client sees as the error content, so
/// each message is meant to be read on its own.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ToolError {
    /// The remote client could not be built at startup.
    #[error("{domain} client not initialized: {reason}")]
    ClientUnavailable { domain: &'static str, reason: String },

    /// A required argument is missing or malformed.
    #[error(transparent)]
    Validation(#[from] ArgumentError),

    /// An argument is well-formed but not acceptable.
    #[error("{0}")]
    InvalidInput(String),

    /// The request never produced a response.
    #[error("failed to {action}: {source}")]
    RemoteCall {
        action: &'static str,
        #[source]
        source: platform::Error,
    },

    /// The API answered with a status the handler has no specific meaning for.
    #[error(
        "failed to {action}: API returned status {status}{}",
        .message.as_deref().map(|m| format!(" ({m})")).unwrap_or_default()
    )]
    RemoteStatus {
        action: &'static str,
        status: u16,
        message: Option<String>,
    },

    /// A 2xx response that should have carried a payload did not.
    #[error("failed to {action}: API returned an empty response")]
    EmptyResponse { action: &'static str },

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0}")]
    NotFound(String),

    /// The external CLI exited non-zero; the message is its captured output.
    #[error("{0}")]
    ExternalProcess(String),

    /// The external CLI could not be started at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ToolError {
    pub(crate) fn remote_call(action: &'static str, source: platform::Error) -> Self {
        Self::RemoteCall { action, source }
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;
