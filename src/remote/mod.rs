//! External service contracts — classification and denoising.
//!
//! Both services are black boxes consumed as request/response contracts:
//! the artifact goes up as a multipart upload, a small JSON verdict (or a
//! canonical WAV) comes back.  The traits are the seam; `Api*` implementors
//! speak HTTP via `reqwest`, tests substitute in-memory doubles.

pub mod classifier;
pub mod denoiser;

use thiserror::Error;

pub use classifier::{ApiClassifier, Classification, Classifier, Label};
pub use denoiser::{ApiDenoiser, Denoiser};

// ---------------------------------------------------------------------------
// RemoteError
// ---------------------------------------------------------------------------

/// Errors shared by both service clients.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("service request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("service returned status {0}")]
    Status(u16),

    /// The response body could not be parsed.
    #[error("failed to parse service response: {0}")]
    Parse(String),

    /// The response parsed but violates the documented contract.
    #[error("service response violates the contract: {0}")]
    Contract(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else {
            RemoteError::Request(e.to_string())
        }
    }
}
