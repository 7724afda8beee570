//! Error types for Screeps API operations.
//!
//! A 404 on a history window is *not* represented here: it is an expected
//! outcome modeled as [`crate::types::HistoryFetch::NotYetAvailable`]. Every
//! variant of [`ApiError`] is a hard upstream error in the sense of the
//! pipeline's error taxonomy.

use thiserror::Error;

/// Errors returned by the Screeps API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upstream returned a non-2xx status (other than a history 404).
    #[error("Screeps API error: {status} - {message}")]
    Http { status: u16, message: String },

    /// Connection-level failure (DNS, TLS, timeout, reset).
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body was not the JSON shape we expected.
    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// Endpoint answered but rejected the call (`ok` != 1).
    #[error("Screeps API rejected request to {endpoint}")]
    Rejected { endpoint: String },

    /// A field we require was absent from an otherwise valid response.
    #[error("Response from {endpoint} is missing field '{field}'")]
    MissingField { endpoint: String, field: String },
}

impl ApiError {
    /// Check if this error represents a transient condition.
    ///
    /// Server errors and connection failures may succeed on a later cycle;
    /// decode failures and rejections indicate a contract problem and will
    /// not improve by retrying immediately (though the pipeline still retries
    /// whole units of work on its next rotation).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::Request(_) => true,
            Self::Decode { .. } => false,
            Self::Rejected { .. } => false,
            Self::MissingField { .. } => false,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
