//! Cloud resolution error types.

use thiserror::Error;

use crate::error::StorageError;

/// Failures building the resolver. Per-link problems are [`LinkFailure`]s.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid link pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),
}

/// Why one candidate link was abandoned.
///
/// Logged and contained: the resolver moves on to the next link.
#[derive(Error, Debug)]
pub enum LinkFailure {
    #[error("not a valid URL: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server answered {0}")]
    Status(reqwest::StatusCode),

    #[error("download link returned another HTML page")]
    LandingPage,

    #[error("landing page contains no download links")]
    NoDirectLinks,

    #[error("rejected {filename} ({content_type})")]
    Rejected {
        filename: String,
        content_type: String,
    },

    #[error("could not store download: {0}")]
    Storage(#[from] StorageError),
}
