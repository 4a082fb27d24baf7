use hoard_types::BlobId;

/// Errors from blob repository and object backend operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested blob was never stored.
    #[error("blob not found: {0}")]
    NotFound(BlobId),

    /// Stored bytes no longer hash to their key (data corruption).
    #[error("corrupt blob {id}: stored bytes hash to {computed}")]
    Corrupt { id: BlobId, computed: BlobId },

    /// The bucket has not been created yet.
    #[error("bucket does not exist: {0}")]
    BucketMissing(String),

    /// The backend call failed; safe to retry.
    #[error("object backend {op} failed for {key}: {reason}")]
    Backend {
        op: &'static str,
        key: String,
        reason: String,
    },

    /// I/O error from a filesystem backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for failures a caller may retry with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Backend { .. } | Self::Io(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
