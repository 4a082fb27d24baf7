use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use hoard_index::{
    AggregateCounter, AttributeStore, CasBudget, CountOutcome, IndexPage,
    InMemoryAttributeStore, RecordOutcome, TimeIndex,
};
use hoard_protocol::{
    BlobEntry, BlobSource, BlobsResponse, Enumeration, StatsResponse, DEFAULT_CHANNEL_CAPACITY,
};
use hoard_store::{Blob, BlobRepository, InMemoryObjectBackend, ObjectBackend};
use hoard_types::{BlobId, Timestamp};
use tracing::{debug, info, warn};

use crate::error::{SdkError, SdkResult};
use crate::upload::{UploadPart, UploadReceipt};

/// High-level hoard engine.
///
/// Built once at startup and shared behind an `Arc`. Every operation is
/// safe to call concurrently.
pub struct Hoard {
    repository: BlobRepository,
    index: TimeIndex,
    counter: AggregateCounter,
    attributes: Arc<dyn AttributeStore>,
    bucket: String,
    index_domain: String,
    started_at: Timestamp,
}

impl Hoard {
    /// Assemble an engine over the given object backend and attribute store.
    pub fn new(objects: Arc<dyn ObjectBackend>, attributes: Arc<dyn AttributeStore>) -> Self {
        Self {
            bucket: objects.bucket().to_string(),
            index_domain: attributes.domain().to_string(),
            repository: BlobRepository::new(objects),
            index: TimeIndex::new(attributes.clone()),
            counter: AggregateCounter::new(attributes.clone()),
            attributes,
            started_at: Timestamp::now(),
        }
    }

    /// An engine backed entirely by memory. Call [`Hoard::init`] before use.
    pub fn in_memory(bucket: impl Into<String>, index_domain: impl Into<String>) -> Self {
        Self::new(
            Arc::new(InMemoryObjectBackend::new(bucket)),
            Arc::new(InMemoryAttributeStore::new(index_domain)),
        )
    }

    /// Cap the entries returned by one index query.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.index = self.index.with_max_page_size(page_size);
        self
    }

    /// Bound the counter's compare-and-swap retries.
    pub fn with_counter_budget(mut self, budget: CasBudget) -> Self {
        self.counter = self.counter.with_budget(budget);
        self
    }

    /// Re-hash blobs on every read.
    pub fn with_read_verification(mut self, enabled: bool) -> Self {
        self.repository = self.repository.with_read_verification(enabled);
        self
    }

    /// Create the object bucket and index domain if they are missing.
    pub async fn init(&self) -> SdkResult<()> {
        self.repository.backend().ensure_bucket().await?;
        self.attributes.ensure_domain().await?;
        info!(bucket = %self.bucket, domain = %self.index_domain, "hoard ready");
        Ok(())
    }

    // ---- Content operations ----

    /// Store one payload, index it, and count its bytes.
    ///
    /// The steps run in that order and stop at the first failure, so an
    /// index entry never exists for bytes that were not stored. Every step
    /// is repeatable: storing and indexing are skipped when already done,
    /// and the counter records which blobs it has counted. Re-uploading
    /// after a failure therefore completes whatever the failed call left
    /// undone without counting the bytes twice.
    pub async fn upload(&self, part: UploadPart) -> SdkResult<UploadReceipt> {
        let blob = match part.claimed {
            Some(claimed) => Blob::from_claim(&claimed, part.data)?,
            None => Blob::new(part.data),
        };
        let id = blob.id();

        let stored = self.repository.put(&blob).await?;
        let is_new = match self.index.record(&id).await? {
            RecordOutcome::Inserted(time) => {
                if !stored.is_new {
                    warn!(id = %id.short_hex(), "indexing blob stored by an earlier upload");
                }
                debug!(id = %id.short_hex(), %time, "blob indexed");
                true
            }
            RecordOutcome::AlreadyIndexed => false,
        };

        match self.counter.count_blob(&id, blob.size()).await? {
            CountOutcome::Added(total) if is_new => {
                debug!(id = %id.short_hex(), size = blob.size(), total, "blob uploaded");
            }
            CountOutcome::Added(total) => {
                debug!(id = %id.short_hex(), size = blob.size(), total, "counted blob indexed by another upload");
            }
            CountOutcome::AlreadyCounted(_) => {
                debug!(id = %id.short_hex(), "duplicate upload");
            }
        }

        Ok(UploadReceipt {
            id,
            size: blob.size(),
            is_new,
        })
    }

    /// Upload parts in order, stopping at the first failure.
    ///
    /// Parts before the failing one stay stored.
    pub async fn upload_many(
        &self,
        parts: impl IntoIterator<Item = UploadPart>,
    ) -> SdkResult<Vec<UploadReceipt>> {
        let mut receipts = Vec::new();
        for part in parts {
            receipts.push(self.upload(part).await?);
        }
        Ok(receipts)
    }

    /// The bytes stored under `id`.
    pub async fn get(&self, id: &BlobId) -> SdkResult<Bytes> {
        Ok(self.repository.get(id).await?)
    }

    /// Whether `id` is stored.
    pub async fn contains(&self, id: &BlobId) -> SdkResult<bool> {
        Ok(self.repository.contains(id).await?)
    }

    // ---- Index operations ----

    /// Blobs indexed in `start < time <= end`, ascending.
    pub async fn query(
        &self,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        limit: usize,
    ) -> SdkResult<IndexPage> {
        Ok(self.index.query(start, end, limit).await?)
    }

    /// When `id` was first indexed.
    pub async fn indexed_at(&self, id: &BlobId) -> SdkResult<Option<Timestamp>> {
        Ok(self.index.lookup(id).await?)
    }

    /// Walk every blob in `start < time <= end`, streaming contents.
    pub fn iter(
        self: &Arc<Self>,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> Enumeration<SdkError> {
        Enumeration::spawn(self.clone(), start, end, DEFAULT_CHANNEL_CAPACITY)
    }

    // ---- Statistics ----

    /// Blob count, total bytes, and process metadata.
    pub async fn stats(&self) -> SdkResult<StatsResponse> {
        Ok(StatsResponse {
            blob_count: self.index.count().await?,
            blob_size: self.counter.total().await?,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: self.started_at,
            bucket: self.bucket.clone(),
            index_domain: self.index_domain.clone(),
        })
    }

    // ---- Accessors ----

    pub fn repository(&self) -> &BlobRepository {
        &self.repository
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn index_domain(&self) -> &str {
        &self.index_domain
    }

    pub fn page_size(&self) -> usize {
        self.index.max_page_size()
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }
}

impl std::fmt::Debug for Hoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hoard")
            .field("bucket", &self.bucket)
            .field("index_domain", &self.index_domain)
            .field("page_size", &self.index.max_page_size())
            .field("started_at", &self.started_at)
            .finish()
    }
}

#[async_trait]
impl BlobSource for Hoard {
    type Error = SdkError;

    async fn query_page(
        &self,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> SdkResult<BlobsResponse> {
        let page = self.query(start, end, 0).await?;
        Ok(BlobsResponse {
            blobs: page
                .entries
                .into_iter()
                .map(|e| BlobEntry {
                    hash: e.id,
                    time: e.time,
                })
                .collect(),
            start: page.start,
            end: page.end,
        })
    }

    async fn fetch(&self, id: &BlobId) -> SdkResult<Bytes> {
        self.get(id).await
    }
}
