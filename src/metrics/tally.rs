//! Monotone sharded tally.

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

use crate::metrics::{Observable, NUM_COMPONENTS, THREAD_SLOT_INDEX};

/// A monotone event count spread over cache-padded shards.
///
/// Writes touch only the calling thread's shard with a relaxed `fetch_add`;
/// reads sum every shard.
///
/// # Examples
///
/// ```rust
/// use contesa::metrics::{Observable, Tally};
/// use std::sync::Arc;
/// use std::thread;
///
/// let tally = Arc::new(Tally::new());
/// let mut handles = vec![];
///
/// for _ in 0..4 {
///     let t = Arc::clone(&tally);
///     handles.push(thread::spawn(move || {
///         for _ in 0..1000 {
///             t.incr();
///         }
///     }));
/// }
///
/// for h in handles {
///     h.join().unwrap();
/// }
///
/// assert_eq!(tally.value(), 4000);
/// ```
pub struct Tally {
    name: &'static str,
    components: [CachePadded<AtomicU64>; NUM_COMPONENTS],
}

impl Tally {
    /// Creates an unnamed tally at zero.
    pub const fn new() -> Self {
        const ZERO: CachePadded<AtomicU64> = CachePadded::new(AtomicU64::new(0));
        Tally {
            components: [ZERO; NUM_COMPONENTS],
            name: "",
        }
    }

    /// Sets the name, returning `self` for chaining.
    pub const fn with_name(self, name: &'static str) -> Self {
        Self { name, ..self }
    }

    #[inline]
    fn component(&self) -> &AtomicU64 {
        THREAD_SLOT_INDEX.with(|idx| &self.components[*idx])
    }

    /// Adds `n` to the calling thread's shard.
    #[inline]
    pub fn add(&self, n: u64) {
        self.component().fetch_add(n, Ordering::Relaxed);
    }

    /// Adds one.
    #[inline]
    pub fn incr(&self) {
        self.add(1);
    }
}

impl Observable for Tally {
    #[inline]
    fn name(&self) -> &str {
        self.name
    }

    #[inline]
    fn value(&self) -> u64 {
        self.components
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .fold(0u64, u64::wrapping_add)
    }

    fn value_and_reset(&self) -> u64 {
        self.components
            .iter()
            .map(|c| c.swap(0, Ordering::Relaxed))
            .fold(0u64, u64::wrapping_add)
    }
}

impl Default for Tally {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Tally {
    /// Output format: `name{ [slot]:value ... }`, non-zero shards only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.name)?;
        for (i, c) in self.components.iter().enumerate() {
            let val = c.load(Ordering::Relaxed);
            if val != 0 {
                write!(f, " [{i}]:{val}")?;
            }
        }
        write!(f, " }}")
    }
}
