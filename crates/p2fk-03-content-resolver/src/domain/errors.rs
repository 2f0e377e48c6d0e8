//! Content resolver error types.

use thiserror::Error;

/// Errors from fetching content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// The endpoint answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}")]
    Http { endpoint: String, status: u16 },

    /// The endpoint answered with no bytes.
    #[error("{endpoint} returned an empty body")]
    EmptyBody { endpoint: String },

    /// The request could not be completed.
    #[error("request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    /// No endpoints are configured.
    #[error("no content endpoints configured")]
    NoEndpoints,

    /// Every attempt failed.
    #[error("content {hash} unavailable after {attempts} attempts: {last}")]
    Exhausted {
        hash: String,
        attempts: u32,
        last: Box<ContentError>,
    },

    /// The caller cancelled the download.
    #[error("download of {hash} cancelled")]
    Cancelled { hash: String },

    /// The HTTP client could not be built.
    #[error("http client: {0}")]
    Client(String),
}
