//! Error types for store and queue operations.

use thiserror::Error;

/// Errors raised by store providers and the typed layers above them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed (connection, protocol, or I/O).
    #[error("Store backend error: {message}")]
    Backend { message: String },

    /// A persisted record could not be serialized or parsed.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A queue entry carried an envelope version this build does not
    /// understand.
    #[error("Unsupported queue envelope version {found} (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },
}

impl StoreError {
    /// Check if this error represents a transient condition.
    ///
    /// Backend failures may clear up; serialization and versioning problems
    /// are permanent for the record in question.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Backend { .. } => true,
            Self::Serialization(_) => false,
            Self::VersionMismatch { .. } => false,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
