//! The [`AttributeStore`] trait defining the index storage interface.
//!
//! Any backend (in-memory, a hosted key-attribute database) implements this
//! trait to hold the time index and the aggregate counter.

use async_trait::async_trait;

use crate::attributes::{Attributes, Item, Precondition, RangeQuery};
use crate::error::IndexResult;

/// Storage backend for a single domain of attributed items.
///
/// Implementations must be thread-safe (`Send + Sync`) and guarantee:
///
/// - `put` evaluates its [`Precondition`] and applies the write atomically;
///   a failed condition is reported as
///   [`IndexError::ConditionFailed`](crate::IndexError::ConditionFailed)
///   and leaves the item untouched.
/// - `put` merges: attributes not named in the write keep their values.
/// - Reads observe every write that completed before they started.
#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Name of the domain this store reads and writes.
    fn domain(&self) -> &str;

    /// Create the domain if it does not already exist.
    async fn ensure_domain(&self) -> IndexResult<()>;

    /// Read all attributes of `item`.
    ///
    /// Returns `Ok(None)` if the item has never been written.
    async fn get(&self, item: &str) -> IndexResult<Option<Attributes>>;

    /// Read one attribute of `item`.
    ///
    /// Default implementation reads the whole item. Backends that can fetch
    /// a single attribute should override it.
    async fn get_attr(&self, item: &str, attr: &str) -> IndexResult<Option<String>> {
        Ok(self.get(item).await?.and_then(|mut attrs| attrs.remove(attr)))
    }

    /// Write `attrs` onto `item` if `precondition` holds.
    async fn put(&self, item: &str, attrs: Attributes, precondition: &Precondition)
        -> IndexResult<()>;

    /// Select items whose `query.attr` lies in the query's range.
    async fn select(&self, query: &RangeQuery) -> IndexResult<Vec<Item>>;

    /// Count items that carry the named attribute.
    async fn count(&self, attr: &str) -> IndexResult<u64>;
}
