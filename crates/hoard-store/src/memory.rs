use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::backend::ObjectBackend;
use crate::error::{StoreError, StoreResult};

/// In-memory, HashMap-based object bucket.
///
/// Intended for tests and embedding. Values are held behind a `RwLock`;
/// `Bytes` clones are reference-counted so reads never copy payloads. Like a
/// remote bucket, it rejects reads and writes until [`ensure_bucket`] has run.
///
/// [`ensure_bucket`]: ObjectBackend::ensure_bucket
pub struct InMemoryObjectBackend {
    bucket: String,
    created: AtomicBool,
    objects: RwLock<HashMap<String, Bytes>>,
}

impl InMemoryObjectBackend {
    /// Create a backend for the named bucket. The bucket starts out missing.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            created: AtomicBool::new(false),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the bucket holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|v| v.len() as u64)
            .sum()
    }

    /// Overwrite a stored value without any checks (test hook for corruption).
    pub fn overwrite_unchecked(&self, key: &str, data: Bytes) {
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), data);
    }

    fn check_bucket(&self) -> StoreResult<()> {
        if self.created.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::BucketMissing(self.bucket.clone()))
        }
    }
}

#[async_trait]
impl ObjectBackend for InMemoryObjectBackend {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn ensure_bucket(&self) -> StoreResult<()> {
        self.created.store(true, Ordering::Release);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        self.check_bucket()?;
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    async fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        self.check_bucket()?;
        let mut map = self.objects.write().expect("lock poisoned");
        map.insert(key.to_string(), data);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.check_bucket()?;
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }
}

impl std::fmt::Debug for InMemoryObjectBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectBackend")
            .field("bucket", &self.bucket)
            .field("object_count", &self.len())
            .finish()
    }
}
