use std::sync::Arc;

use bytes::Bytes;
use hoard_crypto::ContentAddresser;
use hoard_types::BlobId;
use tracing::debug;

use crate::backend::ObjectBackend;
use crate::blob::Blob;
use crate::error::{StoreError, StoreResult};

/// Result of [`BlobRepository::put`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PutOutcome {
    /// `false` when the blob was already present and nothing was written.
    pub is_new: bool,
}

/// Owns the mapping from [`BlobId`] to stored bytes.
///
/// Objects are keyed by [`BlobId::fanout_key`]. `put` checks for an existing
/// object before writing; two concurrent first writers of the same id may
/// both write, which is safe because they write identical bytes under the
/// same key. The repository never retries backend calls.
#[derive(Clone)]
pub struct BlobRepository {
    backend: Arc<dyn ObjectBackend>,
    verify_reads: bool,
}

impl BlobRepository {
    /// Create a repository over the given backend.
    pub fn new(backend: Arc<dyn ObjectBackend>) -> Self {
        Self {
            backend,
            verify_reads: false,
        }
    }

    /// Re-hash bytes on every read and fail with [`StoreError::Corrupt`] on mismatch.
    pub fn with_read_verification(mut self, enabled: bool) -> Self {
        self.verify_reads = enabled;
        self
    }

    /// The underlying object backend.
    pub fn backend(&self) -> &dyn ObjectBackend {
        self.backend.as_ref()
    }

    /// Fetch the payload stored under `id`.
    pub async fn get(&self, id: &BlobId) -> StoreResult<Bytes> {
        let data = self
            .backend
            .get(&id.fanout_key())
            .await?
            .ok_or(StoreError::NotFound(*id))?;
        if self.verify_reads {
            let computed = ContentAddresser::identify(&data);
            if computed != *id {
                return Err(StoreError::Corrupt { id: *id, computed });
            }
        }
        Ok(data)
    }

    /// Store a blob unless it is already present.
    pub async fn put(&self, blob: &Blob) -> StoreResult<PutOutcome> {
        let key = blob.id().fanout_key();
        if self.backend.exists(&key).await? {
            debug!(id = %blob.id().short_hex(), "blob already stored");
            return Ok(PutOutcome { is_new: false });
        }
        self.backend.put(&key, blob.data().clone()).await?;
        debug!(id = %blob.id().short_hex(), size = blob.size(), "blob stored");
        Ok(PutOutcome { is_new: true })
    }

    /// Check whether a blob is stored.
    pub async fn contains(&self, id: &BlobId) -> StoreResult<bool> {
        self.backend.exists(&id.fanout_key()).await
    }
}

impl std::fmt::Debug for BlobRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobRepository")
            .field("bucket", &self.backend.bucket())
            .field("verify_reads", &self.verify_reads)
            .finish()
    }
}
