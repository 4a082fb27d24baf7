//! Running byte total maintained with compare-and-swap.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hoard_types::BlobId;
use tracing::{debug, warn};

use crate::attributes::{single, Precondition};
use crate::error::{IndexError, IndexResult};
use crate::traits::AttributeStore;

/// Reserved item holding the aggregate byte count.
pub const COUNTER_ITEM: &str = "size";

/// Attribute on [`COUNTER_ITEM`] holding the decimal total.
pub const COUNTER_ATTR: &str = "size";

/// Bounds on the compare-and-swap retry loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CasBudget {
    /// Maximum conditional writes before giving up.
    pub max_attempts: u32,
    /// Maximum wall time spent retrying.
    pub max_elapsed: Duration,
}

impl Default for CasBudget {
    fn default() -> Self {
        Self {
            max_attempts: 64,
            max_elapsed: Duration::from_secs(5),
        }
    }
}

/// Prefix of the attributes on [`COUNTER_ITEM`] naming blobs already counted.
pub const COUNTED_PREFIX: &str = "counted:";

/// Result of [`AggregateCounter::count_blob`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountOutcome {
    /// The blob's bytes were added; carries the new total.
    Added(u64),
    /// An earlier call already counted this blob; carries the current total.
    AlreadyCounted(u64),
}

impl CountOutcome {
    /// The counter value observed by the call.
    pub fn total(self) -> u64 {
        match self {
            Self::Added(total) | Self::AlreadyCounted(total) => total,
        }
    }
}

/// Total bytes of all stored blobs.
///
/// The value is a decimal string on a single item. An update reads it, then
/// writes the sum conditional on the value being unchanged, and retries on
/// conflict until the [`CasBudget`] runs out.
///
/// [`count_blob`](Self::count_blob) also records the blob on the counter
/// item in the same conditional write, so a blob is counted at most once no
/// matter how often the call is repeated. The counter item therefore holds
/// one marker attribute per counted blob.
pub struct AggregateCounter {
    store: Arc<dyn AttributeStore>,
    budget: CasBudget,
}

impl AggregateCounter {
    pub fn new(store: Arc<dyn AttributeStore>) -> Self {
        Self {
            store,
            budget: CasBudget::default(),
        }
    }

    pub fn with_budget(mut self, budget: CasBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn budget(&self) -> CasBudget {
        self.budget
    }

    /// Current total, zero if nothing has been counted yet.
    pub async fn total(&self) -> IndexResult<u64> {
        Ok(self.read().await?.unwrap_or(0))
    }

    /// Add `delta` bytes, returning the new total.
    ///
    /// Conflicting writers cause a retry; any other store error is returned
    /// immediately. Fails with [`IndexError::ConflictRetryExceeded`] once the
    /// budget is spent.
    pub async fn add_bytes(&self, delta: u64) -> IndexResult<u64> {
        Ok(self.update(delta, None).await?.total())
    }

    /// Add the `size` bytes of blob `id` unless it was counted before.
    ///
    /// Safe to repeat after a failure: a call that returned an error left no
    /// marker, and a call that succeeded makes every later one a no-op.
    pub async fn count_blob(&self, id: &BlobId, size: u64) -> IndexResult<CountOutcome> {
        let marker = format!("{COUNTED_PREFIX}{}", id.to_hex());
        self.update(size, Some(&marker)).await
    }

    /// Whether blob `id` has been counted.
    pub async fn is_counted(&self, id: &BlobId) -> IndexResult<bool> {
        let marker = format!("{COUNTED_PREFIX}{}", id.to_hex());
        Ok(self.store.get_attr(COUNTER_ITEM, &marker).await?.is_some())
    }

    // Every write that sets a marker also raises the total (or creates it),
    // so a marker absent when the total was read is still absent when the
    // conditional write on that total succeeds. Zero-byte blobs may be
    // marked twice, which adds nothing.
    async fn update(&self, delta: u64, marker: Option<&str>) -> IndexResult<CountOutcome> {
        let started = Instant::now();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let current = self.read().await?;
            if let Some(marker) = marker {
                if self.store.get_attr(COUNTER_ITEM, marker).await?.is_some() {
                    debug!(marker, attempts, "blob already counted");
                    return Ok(CountOutcome::AlreadyCounted(current.unwrap_or(0)));
                }
            }
            let (next, precondition) = match current {
                None => (delta, Precondition::Absent(COUNTER_ATTR.to_string())),
                Some(value) => {
                    let next = value
                        .checked_add(delta)
                        .ok_or(IndexError::CounterOverflow {
                            current: value,
                            delta,
                        })?;
                    let precondition = Precondition::Equals {
                        name: COUNTER_ATTR.to_string(),
                        value: value.to_string(),
                    };
                    (next, precondition)
                }
            };

            let mut attrs = single(COUNTER_ATTR, next.to_string());
            if let Some(marker) = marker {
                attrs.insert(marker.to_string(), delta.to_string());
            }
            match self.store.put(COUNTER_ITEM, attrs, &precondition).await {
                Ok(()) => {
                    debug!(delta, total = next, attempts, "counter updated");
                    return Ok(CountOutcome::Added(next));
                }
                Err(IndexError::ConditionFailed { .. }) => {
                    let elapsed = started.elapsed();
                    if attempts >= self.budget.max_attempts || elapsed >= self.budget.max_elapsed {
                        warn!(delta, attempts, ?elapsed, "counter update abandoned");
                        return Err(IndexError::ConflictRetryExceeded {
                            attempts,
                            elapsed_ms: elapsed.as_millis() as u64,
                        });
                    }
                    tokio::task::yield_now().await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn read(&self) -> IndexResult<Option<u64>> {
        let Some(raw) = self.store.get_attr(COUNTER_ITEM, COUNTER_ATTR).await? else {
            return Ok(None);
        };
        raw.parse::<u64>().map(Some).map_err(|_| IndexError::InvalidValue {
            item: COUNTER_ITEM.to_string(),
            attr: COUNTER_ATTR.to_string(),
            value: raw,
        })
    }
}

impl std::fmt::Debug for AggregateCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateCounter")
            .field("domain", &self.store.domain())
            .field("budget", &self.budget)
            .finish()
    }
}
