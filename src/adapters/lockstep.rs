//! Deterministic contention simulator.
//!
//! Real threads race nondeterministically, so the number of optimistic
//! increments lost in a run varies. [`Lockstep`] removes the scheduler from
//! the picture: every versioned read and every versioned write first waits
//! at a cyclic barrier until all *active* callers have arrived. Each round
//! therefore looks like this:
//!
//! ```text
//!   round k:  all active callers read  ──► same revision r
//!             all active callers write ──► one CAS succeeds (r → r+1),
//!                                          the rest conflict
//!             winner leaves; losers with attempts left start round k+1
//! ```
//!
//! With N callers and `max_retries = R`, exactly `min(N, R)` increments land
//! and `N - min(N, R)` callers give up. Each caller must call
//! [`Lockstep::leave`] once its service call has returned, otherwise the
//! remaining callers wait for it forever.

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::error::Result;
use crate::record::{CounterRecord, RecordId};
use crate::store::{ResourceStore, VersionedWrite};

#[derive(Debug)]
struct Phase {
    parties: usize,
    arrived: usize,
    generation: u64,
}

impl Phase {
    fn release(&mut self) {
        self.arrived = 0;
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Cyclic barrier whose party count shrinks as callers leave.
struct Gate {
    phase: Mutex<Phase>,
    released: Condvar,
}

impl Gate {
    fn new(parties: usize) -> Self {
        Self {
            phase: Mutex::new(Phase {
                parties,
                arrived: 0,
                generation: 0,
            }),
            released: Condvar::new(),
        }
    }

    fn arrive(&self) {
        let mut phase = self.phase.lock();
        let generation = phase.generation;
        phase.arrived += 1;
        if phase.arrived >= phase.parties {
            phase.release();
            self.released.notify_all();
            return;
        }
        while phase.generation == generation {
            self.released.wait(&mut phase);
        }
    }

    fn leave(&self) {
        let mut phase = self.phase.lock();
        phase.parties = phase.parties.saturating_sub(1);
        if phase.arrived > 0 && phase.arrived >= phase.parties {
            phase.release();
            self.released.notify_all();
        }
    }
}

/// A [`ResourceStore`] wrapper that forces optimistic callers into lockstep
/// rounds.
///
/// Only [`read_versioned`](ResourceStore::read_versioned) and
/// [`write_versioned`](ResourceStore::write_versioned) are gated; every other
/// operation passes straight through.
///
/// # Example
///
/// ```rust
/// use contesa::adapters::Lockstep;
/// use contesa::record::{CounterRecord, RecordId};
/// use contesa::service::CounterService;
/// use contesa::store::{MemoryFastStore, MemoryStore, ResourceStore};
/// use std::sync::Arc;
/// use std::thread;
///
/// let callers = 6;
/// let id = RecordId::new(1);
/// let records = Arc::new(Lockstep::new(MemoryStore::new(), callers));
/// records.insert(CounterRecord::new(id)).unwrap();
/// let service = CounterService::new(Arc::clone(&records), Arc::new(MemoryFastStore::new()));
///
/// thread::scope(|s| {
///     for _ in 0..callers {
///         s.spawn(|| {
///             service.increment_optimistic_with(id, 4).unwrap();
///             records.leave();
///         });
///     }
/// });
///
/// assert_eq!(records.read_versioned(id).unwrap().value, 4);
/// ```
pub struct Lockstep<S> {
    inner: S,
    gate: Gate,
    arrivals: AtomicU64,
}

impl<S> Lockstep<S> {
    /// Wraps `inner` for `parties` concurrent callers.
    pub fn new(inner: S, parties: usize) -> Self {
        Self {
            inner,
            gate: Gate::new(parties),
            arrivals: AtomicU64::new(0),
        }
    }

    /// Withdraws the calling party from all future rounds.
    pub fn leave(&self) {
        self.gate.leave();
    }

    /// Number of gated operations performed so far.
    pub fn arrivals(&self) -> u64 {
        self.arrivals.load(Ordering::Relaxed)
    }

    fn arrive(&self) {
        self.arrivals.fetch_add(1, Ordering::Relaxed);
        self.gate.arrive();
    }
}

impl<S: ResourceStore> ResourceStore for Lockstep<S> {
    type Unit = S::Unit;

    fn insert(&self, record: CounterRecord) -> Result<bool> {
        self.inner.insert(record)
    }

    fn acquire_exclusive(&self, id: RecordId) -> Result<Self::Unit> {
        self.inner.acquire_exclusive(id)
    }

    fn read_versioned(&self, id: RecordId) -> Result<CounterRecord> {
        self.arrive();
        self.inner.read_versioned(id)
    }

    fn write_versioned(&self, record: &CounterRecord) -> Result<VersionedWrite> {
        self.arrive();
        self.inner.write_versioned(record)
    }

    fn increment_by_code(&self, code: &str) -> Result<usize> {
        self.inner.increment_by_code(code)
    }

    fn sum_values(&self) -> Result<u64> {
        self.inner.sum_values()
    }
}

impl<S: Debug> Debug for Lockstep<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lockstep")
            .field("inner", &self.inner)
            .field("phase", &*self.gate.phase.lock())
            .finish()
    }
}
