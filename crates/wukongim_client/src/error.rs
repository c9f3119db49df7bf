//! Error types for the client.

use thiserror::Error;
use wukongim_protocol::WireError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by every client operation.
///
/// These four kinds are the only errors that cross the crate boundary.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A local precondition failed; no request was sent.
    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    /// The request could not be delivered (connection, timeout, I/O).
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The backend answered with a non-success status.
    #[error("protocol error: HTTP {status}: {body}")]
    Protocol {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body is not valid JSON or has the wrong shape.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Local precondition violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    /// The client has no configuration yet.
    #[error("client is not configured: api_url is not set")]
    NotConfigured,

    /// `configure` was called on a configured client.
    #[error("client is already configured")]
    AlreadyConfigured,

    /// The configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Cursor arguments are malformed (zero limit, inverted range, ...).
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// Request arguments do not have the shape the endpoint requires.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an invalid cursor error.
    pub fn invalid_cursor(message: impl Into<String>) -> Self {
        Self::Precondition(PreconditionError::InvalidCursor(message.into()))
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::Precondition(PreconditionError::InvalidArgument(message.into()))
    }

    /// Returns true if this error failed locally without a network call.
    pub fn is_precondition(&self) -> bool {
        matches!(self, ClientError::Precondition(_))
    }

    /// Returns the HTTP status for protocol errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { .. } => true,
            ClientError::Protocol { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<WireError> for ClientError {
    fn from(error: WireError) -> Self {
        Self::invalid_argument(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(ClientError::transport("connection refused").is_retryable());
        assert!(ClientError::Protocol {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!ClientError::Protocol {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!ClientError::Decode("eof".into()).is_retryable());
        assert!(!ClientError::from(PreconditionError::NotConfigured).is_retryable());
    }

    #[test]
    fn error_display() {
        let err = ClientError::from(PreconditionError::NotConfigured);
        assert_eq!(
            err.to_string(),
            "precondition failed: client is not configured: api_url is not set"
        );

        let err = ClientError::Protocol {
            status: 500,
            body: "boom".into(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("boom"));
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn wire_errors_are_preconditions() {
        let err: ClientError = WireError::invalid("uid must not be empty").into();
        assert!(err.is_precondition());
        assert!(matches!(
            err,
            ClientError::Precondition(PreconditionError::InvalidArgument(_))
        ));
    }
}
