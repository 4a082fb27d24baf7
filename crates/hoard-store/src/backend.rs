use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreResult;

/// Opaque object storage: a single bucket of byte values addressed by key.
///
/// Implementations must satisfy these invariants:
/// - `put` of the same key with the same bytes is idempotent.
/// - A successful `put` is visible to every later `get`.
/// - Values are never interpreted; the backend is a pure key-value store.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Name of the bucket this backend writes to.
    fn bucket(&self) -> &str;

    /// Create the bucket if it does not already exist.
    async fn ensure_bucket(&self) -> StoreResult<()>;

    /// Fetch the value stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing was stored under that key.
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>>;

    /// Store `data` under `key`, replacing any previous value.
    async fn put(&self, key: &str, data: Bytes) -> StoreResult<()>;

    /// Check whether a value exists under `key`.
    ///
    /// Default implementation fetches the value. Backends with a cheaper
    /// metadata lookup should override it.
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
