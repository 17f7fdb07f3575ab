//! Platform client error types.

use thiserror::Error;

/// Errors raised before or while talking to the Blaxel API.
///
/// A response that arrived with a non-2xx status is *not* an error at this
/// layer; it comes back as an [`ApiResponse`](crate::ApiResponse) so callers
/// can map well-known codes themselves.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No API key could be found in any configuration source.
    #[error("missing API key: set BL_API_KEY or log in with `bl login`")]
    MissingApiKey,

    /// No workspace could be found in any configuration source.
    #[error("missing workspace: set BL_WORKSPACE or log in with `bl login`")]
    MissingWorkspace,

    /// The configured base URL cannot carry path segments.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// Network or transport failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A successful response carried a body that did not decode.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
