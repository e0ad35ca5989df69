//! Sequence allocation service.
//!
//! An explicitly owned counter; callers hold it (usually behind an `Arc`) and
//! every allocation is one read-increment-write under a single mutex.

use std::sync::Mutex;

/// Keyed allocations start at `key * KEYED_SPAN`.
pub const KEYED_SPAN: i64 = 1000;

#[derive(Debug, Default)]
struct Counters {
    next: u64,
    last_keyed: i64,
}

#[derive(Debug, Default)]
pub struct SequenceAllocator {
    counters: Mutex<Counters>,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the plain sequence at `first` instead of 1.
    pub fn starting_at(first: u64) -> Self {
        Self {
            counters: Mutex::new(Counters {
                next: first.saturating_sub(1),
                last_keyed: 0,
            }),
        }
    }

    /// Next value of the plain sequence, starting at 1.
    pub fn next(&self) -> u64 {
        let mut c = self.lock();
        c.next += 1;
        c.next
    }

    /// Next keyed value: at least `key * KEYED_SPAN` and greater than every
    /// keyed value issued before. With `key` in seconds since an epoch, ids
    /// stay time-ordered; a key that has used up its span spills into the
    /// next one, and a key that goes backwards never reissues a value.
    pub fn next_keyed(&self, key: i64) -> i64 {
        let mut c = self.lock();
        let id = key
            .saturating_mul(KEYED_SPAN)
            .max(c.last_keyed.saturating_add(1));
        c.last_keyed = id;
        id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Counters> {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
