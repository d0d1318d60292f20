//! Lock-free tallies recording what each update strategy did.
//!
//! The service bumps these on every call, from every worker thread, so they
//! must not become a contention point of their own. Each [`Tally`] is
//! sharded across [`NUM_COMPONENTS`] cache-padded slots; a thread always
//! writes to the slot it was assigned on first use, and reads aggregate all
//! slots.
//!
//! ```text
//!   Thread 0 ──incr──►  [Slot 0] (CachePadded)
//!   Thread 1 ──incr──►  [Slot 1] (CachePadded)
//!        ...                ...
//!   Thread 63 ─incr──►  [Slot 63] (CachePadded)
//!                           │
//!                           ▼
//!                    value() sums all slots
//! ```
//!
//! Slots are assigned round-robin; thread 64 shares slot 0 with thread 0.
//! That only costs some contention, never correctness.

mod stats;
mod tally;

pub use stats::StrategyStats;
pub use tally::Tally;

use std::fmt::{Debug, Display};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Number of shards per tally. A power of two; 64 slots × 64 bytes = 4KB.
pub(crate) const NUM_COMPONENTS: usize = 64;

static NEXT_SLOT_ID: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    /// Slot assigned to the current thread, stable for its lifetime.
    pub(crate) static THREAD_SLOT_INDEX: usize = next_slot_id();
}

/// Assigns the next slot, in `[0, NUM_COMPONENTS)`.
///
/// Relaxed is enough: two threads landing on the same slot only adds
/// contention.
fn next_slot_id() -> usize {
    NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed) % NUM_COMPONENTS
}

/// A named value that observers can read.
///
/// # Examples
///
/// ```rust
/// use contesa::metrics::{Observable, Tally};
///
/// let tally = Tally::new().with_name("optimistic_give_ups");
/// tally.incr();
///
/// assert_eq!(tally.name(), "optimistic_give_ups");
/// assert_eq!(tally.value(), 1);
/// assert_eq!(tally.value_and_reset(), 1);
/// assert_eq!(tally.value(), 0);
/// ```
pub trait Observable: Debug + Send + Sync {
    /// Static name; empty if none was set.
    fn name(&self) -> &str;

    /// Current aggregated value.
    fn value(&self) -> u64;

    /// Current value, resetting to zero.
    ///
    /// Each shard is swapped atomically but the sweep across shards is not,
    /// so a concurrent increment lands either in the returned value or in
    /// the next read, never in both.
    fn value_and_reset(&self) -> u64;
}

impl Display for dyn Observable + '_ {
    /// Formats as `name:value`, or just `value` when unnamed.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.name().is_empty() {
            write!(f, "{}:{}", self.name(), self.value())
        } else {
            write!(f, "{}", self.value())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_ids_in_range() {
        for _ in 0..(NUM_COMPONENTS * 2) {
            assert!(next_slot_id() < NUM_COMPONENTS);
        }
    }

    #[test]
    fn test_thread_slot_is_stable() {
        let first = THREAD_SLOT_INDEX.with(|idx| *idx);
        let second = THREAD_SLOT_INDEX.with(|idx| *idx);
        assert_eq!(first, second);
    }
}
