//! Error types for storage backends.

use thiserror::Error;

/// Errors that can occur when reading or writing a storage slot.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The backend refused a write because it would exceed its capacity.
    #[error("Storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded {
        /// Bytes the backend would hold after the write.
        needed: usize,
        /// Maximum bytes the backend accepts.
        quota: usize,
    },

    /// The key cannot be used with this backend.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
