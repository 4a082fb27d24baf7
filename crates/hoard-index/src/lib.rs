//! Secondary indexes for hoard.
//!
//! Both indexes live in an [`AttributeStore`]: a domain of named items, each
//! holding string attributes, with conditional writes and ordered range
//! selects. Values are compared as strings, so everything stored here uses a
//! lexicographically sortable encoding.
//!
//! # Architecture
//!
//! - **Time index** ([`TimeIndex`]) maps each blob id to the instant it was
//!   first indexed, and answers `start < time <= end` range queries in
//!   ascending order with a page-size cap. Entries are inserted with an
//!   "absent" precondition so only the first writer of an id wins.
//! - **Aggregate counter** ([`AggregateCounter`]) keeps a running byte total
//!   in a single item, updated by a bounded compare-and-swap loop.
//! - **Clock** ([`MonotonicClock`]) hands out strictly increasing nanosecond
//!   timestamps for index entries.
//!
//! # Modules
//!
//! - [`error`] — Error types for index operations
//! - [`attributes`] — Attribute maps, preconditions, range queries
//! - [`traits`] — The [`AttributeStore`] trait defining the storage interface
//! - [`memory`] — In-memory [`InMemoryAttributeStore`]
//! - [`clock`] — Monotonic timestamp source
//! - [`time_index`] — The time-ordered blob index
//! - [`counter`] — The compare-and-swap byte counter

pub mod attributes;
pub mod clock;
pub mod counter;
pub mod error;
pub mod memory;
pub mod time_index;
pub mod traits;

pub use attributes::{Attributes, Item, Precondition, RangeQuery};
pub use clock::MonotonicClock;
pub use counter::{AggregateCounter, CasBudget, CountOutcome};
pub use error::{IndexError, IndexResult};
pub use memory::InMemoryAttributeStore;
pub use time_index::{IndexEntry, IndexPage, RecordOutcome, TimeIndex};
pub use traits::AttributeStore;
