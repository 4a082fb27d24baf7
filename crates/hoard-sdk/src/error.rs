use hoard_crypto::AddressError;
use hoard_index::IndexError;
use hoard_protocol::ProtocolError;
use hoard_store::StoreError;
use hoard_types::BlobId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("blob not found: {0}")]
    NotFound(BlobId),

    #[error("hash mismatch: claimed {claimed}, content hashes to {computed}")]
    HashMismatch { claimed: String, computed: BlobId },

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl SdkError {
    /// Returns `true` for failures worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(e) => e.is_transient(),
            Self::Index(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<StoreError> for SdkError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

impl From<AddressError> for SdkError {
    fn from(e: AddressError) -> Self {
        match e {
            AddressError::HashMismatch { claimed, computed } => {
                Self::HashMismatch { claimed, computed }
            }
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
