//! Client error types.

use hoard_protocol::ProtocolError;
use hoard_types::BlobId;

/// Errors from hoard API calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error, after retries.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The requested blob is not stored on the server.
    #[error("blob not found: {0}")]
    NotFound(BlobId),
    /// The server returned a non-2xx status.
    #[error("{endpoint} returned {status}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The server acknowledged a different blob than the one sent.
    #[error("server stored {returned}, expected {expected}")]
    UnexpectedId { expected: BlobId, returned: BlobId },
    /// The server acknowledged fewer parts than were sent.
    #[error("server acknowledged {acknowledged} of {sent} parts")]
    ShortUpload { sent: usize, acknowledged: usize },
    /// The base URL could not be parsed.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
