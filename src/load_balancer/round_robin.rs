//! Round-robin cursor.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Round-robin cursor.
/// Stores an offset into whatever list it is handed; the list may change length between calls.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the item at the cursor and advance it.
    ///
    /// The stored cursor is re-clamped modulo `items.len()` before use, so a list that
    /// shrank since the last call never indexes out of bounds. The read-and-advance is a
    /// single atomic update: concurrent callers never land on the same index or skip one.
    pub fn next<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        let len = items.len();
        if len == 0 {
            return None;
        }

        let prev = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c % len + 1) % len))
            .unwrap_or_else(|c| c);

        items.get(prev % len)
    }

    /// Current stored cursor (not clamped).
    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }
}
