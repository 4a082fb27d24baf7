//! Time-ordered index of stored blobs.

use std::sync::Arc;

use hoard_types::{BlobId, Timestamp};
use tracing::debug;

use crate::attributes::{single, Precondition, RangeQuery};
use crate::clock::MonotonicClock;
use crate::error::{IndexError, IndexResult};
use crate::traits::AttributeStore;

/// Attribute holding an entry's canonical timestamp.
pub const TIME_ATTR: &str = "time";

/// Default cap on entries returned by one query.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Result of [`TimeIndex::record`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    /// This call created the entry with the given time.
    Inserted(Timestamp),
    /// The id already had an entry; it was left unchanged.
    AlreadyIndexed,
}

/// One `(id, time)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: BlobId,
    pub time: Timestamp,
}

/// A page of query results plus the window that was actually searched.
///
/// `end` is always concrete: when the caller omitted it, it holds the
/// "now" the index substituted, so follow-up pages can reuse it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexPage {
    pub entries: Vec<IndexEntry>,
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Maps blob ids to the time they were first indexed.
///
/// Each id is one item in the attribute store whose [`TIME_ATTR`] holds the
/// canonical timestamp string. Insertion is conditional on the attribute
/// being absent, so concurrent first uploads of the same blob agree on a
/// single time.
pub struct TimeIndex {
    store: Arc<dyn AttributeStore>,
    clock: MonotonicClock,
    max_page_size: usize,
}

impl TimeIndex {
    /// Create an index over `store` with the default page size.
    pub fn new(store: Arc<dyn AttributeStore>) -> Self {
        Self {
            store,
            clock: MonotonicClock::new(),
            max_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Cap the number of entries a single query may return.
    pub fn with_max_page_size(mut self, max: usize) -> Self {
        self.max_page_size = max.max(1);
        self
    }

    /// The configured page-size cap.
    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    /// Record `id` at the current time unless it is already indexed.
    pub async fn record(&self, id: &BlobId) -> IndexResult<RecordOutcome> {
        let time = self.clock.now();
        let result = self
            .store
            .put(
                &id.to_hex(),
                single(TIME_ATTR, time.to_string()),
                &Precondition::Absent(TIME_ATTR.to_string()),
            )
            .await;
        match result {
            Ok(()) => {
                debug!(id = %id.short_hex(), %time, "indexed");
                Ok(RecordOutcome::Inserted(time))
            }
            Err(IndexError::ConditionFailed { .. }) => {
                debug!(id = %id.short_hex(), "already indexed");
                Ok(RecordOutcome::AlreadyIndexed)
            }
            Err(e) => Err(e),
        }
    }

    /// The time `id` was indexed, if it has been.
    pub async fn lookup(&self, id: &BlobId) -> IndexResult<Option<Timestamp>> {
        let item = id.to_hex();
        let Some(attrs) = self.store.get(&item).await? else {
            return Ok(None);
        };
        attrs
            .get(TIME_ATTR)
            .map(|value| decode_time(&item, value))
            .transpose()
    }

    /// Entries with `start < time <= end`, ascending by time.
    ///
    /// `start` defaults to [`Timestamp::MIN`], `end` to the current time
    /// (never earlier than the last time this index issued).
    /// At most `min(limit, max_page_size)` entries are returned; a `limit`
    /// of zero means "the page-size cap".
    pub async fn query(
        &self,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        limit: usize,
    ) -> IndexResult<IndexPage> {
        let start = start.unwrap_or(Timestamp::MIN);
        let end = end.unwrap_or_else(|| Timestamp::now().max(self.clock.last()));
        let limit = match limit {
            0 => self.max_page_size,
            n => n.min(self.max_page_size),
        };

        if start >= end {
            return Ok(IndexPage {
                entries: Vec::new(),
                start,
                end,
            });
        }

        let items = self
            .store
            .select(&RangeQuery {
                attr: TIME_ATTR.to_string(),
                after: start.to_string(),
                until: end.to_string(),
                limit,
            })
            .await?;

        let entries = items
            .into_iter()
            .map(|item| {
                let value = item.attrs.get(TIME_ATTR).ok_or_else(|| IndexError::InvalidValue {
                    item: item.name.clone(),
                    attr: TIME_ATTR.to_string(),
                    value: String::new(),
                })?;
                Ok(IndexEntry {
                    id: BlobId::from_hex(&item.name)?,
                    time: decode_time(&item.name, value)?,
                })
            })
            .collect::<IndexResult<Vec<_>>>()?;

        debug!(%start, %end, count = entries.len(), "index query");
        Ok(IndexPage { entries, start, end })
    }

    /// Number of indexed blobs.
    pub async fn count(&self) -> IndexResult<u64> {
        self.store.count(TIME_ATTR).await
    }
}

fn decode_time(item: &str, value: &str) -> IndexResult<Timestamp> {
    Timestamp::parse(value).map_err(|_| IndexError::InvalidValue {
        item: item.to_string(),
        attr: TIME_ATTR.to_string(),
        value: value.to_string(),
    })
}

impl std::fmt::Debug for TimeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeIndex")
            .field("domain", &self.store.domain())
            .field("max_page_size", &self.max_page_size)
            .finish()
    }
}
