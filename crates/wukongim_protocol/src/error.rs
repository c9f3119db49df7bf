//! Error types for wire encoding and request construction.

use thiserror::Error;

/// Result type for protocol operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors raised while building requests or decoding cursor strings.
#[derive(Error, Debug)]
pub enum WireError {
    /// An argument does not have the shape the endpoint requires.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A `last_msg_seqs` entry could not be parsed.
    #[error("malformed last_msg_seqs entry {entry:?}: {reason}")]
    MalformedEntry {
        /// The offending entry.
        entry: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The same channel appeared twice in a `last_msg_seqs` string.
    #[error("duplicate last_msg_seqs entry for channel {0}")]
    DuplicateChannel(String),

    /// JSON encoding of a request body failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WireError {
    /// Creates an invalid argument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn malformed(entry: &str, reason: impl Into<String>) -> Self {
        Self::MalformedEntry {
            entry: entry.to_string(),
            reason: reason.into(),
        }
    }
}
