//! Store contracts consumed by the update service, plus in-process
//! reference implementations.
//!
//! Two independent ledgers are modelled here:
//!
//! - [`ResourceStore`]: the durable record store. It offers two access
//!   modes over the same rows, an exclusive unit of work
//!   ([`ResourceStore::acquire_exclusive`]) and a versioned check-and-set
//!   pair ([`ResourceStore::read_versioned`] /
//!   [`ResourceStore::write_versioned`]).
//! - [`FastIncrementStore`]: a cache-like store whose only mutation is an
//!   atomic add-and-return.
//!
//! Nothing links the two. A value written to one is never mirrored into the
//! other; reconciling them is the caller's job.
//!
//! ```text
//!                 ┌──────────────────────────┐
//!   exclusive ──► │ latch (held until commit) │
//!                 ├──────────────────────────┤
//!   versioned ──► │ committed record + rev    │ ◄── read_versioned (no latch)
//!                 └──────────────────────────┘
//!
//!                 ┌──────────────────────────┐
//!   fast ───────► │ AtomicU64 per identity    │
//!                 └──────────────────────────┘
//! ```

mod fast;
mod memory;

pub use fast::MemoryFastStore;
pub use memory::{MemoryStore, MemoryUnit};

use crate::error::Result;
use crate::record::{CounterRecord, RecordId};

/// Outcome of a compare-and-swap write.
///
/// A conflict is an ordinary value, not an error: the caller's copy is stale
/// and must be discarded, nothing was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedWrite {
    /// The write landed; carries the stored record with its new revision.
    Applied(CounterRecord),
    /// The stored revision moved since the caller read it.
    Conflict {
        /// Revision the caller read.
        expected: u64,
        /// Revision found in the store at write time.
        found: u64,
    },
}

impl VersionedWrite {
    /// Returns `true` if the write was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, VersionedWrite::Applied(_))
    }
}

/// A scoped unit of work holding the exclusive lock on one record.
///
/// The lock is released when the unit ends: on [`commit`](UnitOfWork::commit)
/// or when the unit is dropped without committing, which aborts it.
pub trait UnitOfWork {
    /// The record as read under the lock, with any pending changes.
    fn record(&self) -> &CounterRecord;

    /// Stages a new value; nothing is visible until commit.
    fn set_value(&mut self, value: u64);

    /// Persists the staged record with `revision + 1` and releases the lock.
    ///
    /// All-or-nothing: on error nothing was written.
    fn commit(self) -> Result<CounterRecord>;
}

/// The durable record store.
pub trait ResourceStore: Send + Sync {
    /// The unit of work returned by [`acquire_exclusive`](Self::acquire_exclusive).
    type Unit: UnitOfWork;

    /// Creates a record. Returns `false` and leaves the store untouched if
    /// the identity already exists.
    fn insert(&self, record: CounterRecord) -> Result<bool>;

    /// Locks the record exclusively for the lifetime of the returned unit.
    ///
    /// Blocks while another unit on the same identity is live.
    fn acquire_exclusive(&self, id: RecordId) -> Result<Self::Unit>;

    /// Reads the committed record without taking the exclusive lock.
    fn read_versioned(&self, id: RecordId) -> Result<CounterRecord>;

    /// Writes `record` only if the stored revision still equals
    /// `record.revision`; the stored revision becomes `record.revision + 1`.
    fn write_versioned(&self, record: &CounterRecord) -> Result<VersionedWrite>;

    /// Increments every record whose code equals `code` by scanning all rows.
    ///
    /// No read step and no revision check on the caller's side. Returns the
    /// number of rows touched.
    fn increment_by_code(&self, code: &str) -> Result<usize>;

    /// Sum of `value` over all records.
    fn sum_values(&self) -> Result<u64>;
}

/// The fast in-memory counter store.
pub trait FastIncrementStore: Send + Sync {
    /// Adds one to the entry for `id`, creating it at zero first if needed,
    /// and returns the post-increment value.
    fn atomic_increment(&self, id: RecordId) -> Result<u64>;

    /// Current value for `id`; an absent entry reads as zero.
    fn get(&self, id: RecordId) -> Result<u64>;

    /// Sum over all entries.
    fn sum(&self) -> Result<u64>;
}
