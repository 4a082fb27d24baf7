//! Monotonic timestamp source for the time index.
//!
//! Wall-clock readings can repeat or step backwards; [`MonotonicClock`]
//! bumps them so every timestamp it issues is later than the last.

use std::sync::Mutex;

use hoard_types::Timestamp;

/// Strictly increasing nanosecond clock for index entries.
///
/// Each reading is `max(wall_clock, previous + 1ns)`, so two entries recorded
/// by the same process never share a timestamp even when the wall clock
/// stalls or steps backwards. Safe for concurrent use across threads.
pub struct MonotonicClock {
    last: Mutex<Timestamp>,
}

impl MonotonicClock {
    /// Create a clock that has not yet issued a timestamp.
    pub fn new() -> Self {
        Self {
            last: Mutex::new(Timestamp::MIN),
        }
    }

    /// Issue the next timestamp.
    pub fn now(&self) -> Timestamp {
        let wall = Timestamp::now();
        let mut last = self.last.lock().expect("clock mutex poisoned");
        let next = wall.max(last.next());
        *last = next;
        next
    }

    /// The most recently issued timestamp, or [`Timestamp::MIN`].
    pub fn last(&self) -> Timestamp {
        *self.last.lock().expect("clock mutex poisoned")
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MonotonicClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonotonicClock")
            .field("last", &self.last())
            .finish()
    }
}
