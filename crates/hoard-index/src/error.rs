//! Error types for index operations.

use hoard_types::TypeError;
use thiserror::Error;

/// Errors that can occur during index and counter operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A conditional write found the item in a different state.
    #[error("condition failed on {item}: {reason}")]
    ConditionFailed { item: String, reason: String },

    /// The index domain has not been created yet.
    #[error("index domain does not exist: {0}")]
    DomainMissing(String),

    /// The attribute store call failed; safe to retry.
    #[error("attribute store {op} failed: {reason}")]
    Backend { op: &'static str, reason: String },

    /// The compare-and-swap loop ran out of budget.
    #[error("counter update gave up after {attempts} attempts in {elapsed_ms}ms")]
    ConflictRetryExceeded { attempts: u32, elapsed_ms: u64 },

    /// The counter would exceed `u64::MAX`.
    #[error("counter overflow: {current} + {delta}")]
    CounterOverflow { current: u64, delta: u64 },

    /// A stored attribute value could not be decoded.
    #[error("invalid value for {item}.{attr}: {value:?}")]
    InvalidValue {
        item: String,
        attr: String,
        value: String,
    },

    /// A stored identifier or timestamp failed to parse.
    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

impl IndexError {
    /// Returns `true` for failures a caller may retry with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}

/// Convenience alias for index results.
pub type IndexResult<T> = std::result::Result<T, IndexError>;
