use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::backend::ObjectBackend;
use crate::error::{StoreError, StoreResult};

/// Object bucket stored as plain files under `root/bucket/`.
///
/// Keys map to relative paths (`ab/cdef...` becomes a two-level directory
/// layout). Writes land in a temporary sibling file first and are renamed
/// into place, so a reader never observes a partially written object.
pub struct FsObjectBackend {
    bucket: String,
    dir: PathBuf,
    tmp_seq: AtomicU64,
}

impl FsObjectBackend {
    /// Create a backend rooted at `root`; objects go under `root/bucket`.
    pub fn new(root: impl AsRef<Path>, bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        let dir = root.as_ref().join(&bucket);
        Self {
            bucket,
            dir,
            tmp_seq: AtomicU64::new(0),
        }
    }

    /// Directory holding this bucket's objects.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn object_path(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .split('/')
                .all(|seg| !seg.is_empty() && seg != "." && seg != "..");
        if !valid {
            return Err(StoreError::Backend {
                op: "resolve",
                key: key.to_string(),
                reason: "invalid object key".into(),
            });
        }
        Ok(self.dir.join(key))
    }

    async fn check_bucket(&self) -> StoreResult<()> {
        match tokio::fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::BucketMissing(self.bucket.clone())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::BucketMissing(self.bucket.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ObjectBackend for FsObjectBackend {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn ensure_bucket(&self) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        debug!(dir = %self.dir.display(), "bucket ready");
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        let path = self.object_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.check_bucket().await?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        self.check_bucket().await?;
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("tmp-{}-{seq}", std::process::id()));
        tokio::fs::write(&tmp, &data).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let path = self.object_path(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.check_bucket().await?;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for FsObjectBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsObjectBackend")
            .field("bucket", &self.bucket)
            .field("dir", &self.dir)
            .finish()
    }
}
