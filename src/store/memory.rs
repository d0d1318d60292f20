//! In-process durable store with row latches.
//!
//! Each row pairs an exclusive latch with a committed-state cell:
//!
//! - the latch plays the role of a `SELECT ... FOR UPDATE` row lock: a
//!   [`MemoryUnit`] owns it until commit or drop, and every writer
//!   (versioned, unindexed, commit) takes it before touching the row;
//! - the committed cell is read without the latch, so versioned reads never
//!   queue behind an exclusive holder;
//! - a row detached by [`MemoryStore::remove`] is marked under its latch, and
//!   every writer that later obtains that latch reports `NotFound` instead of
//!   writing into the detached row.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex, RwLock};
use tracing::trace;

use crate::error::{Result, StoreError};
use crate::record::{CounterRecord, RecordId};
use crate::store::{ResourceStore, UnitOfWork, VersionedWrite};

struct Row {
    latch: Arc<Mutex<()>>,
    committed: RwLock<CounterRecord>,
    /// Set under the latch once the row has left the map.
    detached: AtomicBool,
}

impl Row {
    fn new(record: CounterRecord) -> Self {
        Self {
            latch: Arc::new(Mutex::new(())),
            committed: RwLock::new(record),
            detached: AtomicBool::new(false),
        }
    }

    /// Fails with `NotFound` if the row was removed. The caller must hold the latch.
    fn ensure_attached(&self) -> Result<()> {
        if self.detached.load(Ordering::Relaxed) {
            return Err(StoreError::NotFound(self.committed.read().id));
        }
        Ok(())
    }

    /// Applies `f` to the committed record and bumps the revision.
    ///
    /// The caller must hold the latch.
    fn apply(&self, f: impl FnOnce(&mut CounterRecord)) -> CounterRecord {
        let mut state = self.committed.write();
        f(&mut state);
        state.revision += 1;
        state.clone()
    }
}

/// Reference [`ResourceStore`] keeping every row in memory.
///
/// # Examples
///
/// ```rust
/// use contesa::record::{CounterRecord, RecordId};
/// use contesa::store::{MemoryStore, ResourceStore, UnitOfWork, VersionedWrite};
///
/// let store = MemoryStore::new();
/// let id = RecordId::new(1);
/// store.insert(CounterRecord::new(id)).unwrap();
///
/// // Pessimistic: read-modify-write under the row latch.
/// let mut unit = store.acquire_exclusive(id).unwrap();
/// let next = unit.record().value + 1;
/// unit.set_value(next);
/// assert_eq!(unit.commit().unwrap().revision, 1);
///
/// // Optimistic: a stale revision is rejected.
/// let stale = CounterRecord::new(id);
/// assert!(matches!(
///     store.write_versioned(&stale.incremented()).unwrap(),
///     VersionedWrite::Conflict { expected: 0, found: 1 }
/// ));
/// ```
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<RecordId, Arc<Row>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns `true` if the store holds no record.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Sets the record's value back to zero.
    ///
    /// Counts as a write: the revision moves forward so in-flight optimistic
    /// writers conflict instead of resurrecting the old value.
    pub fn reset(&self, id: RecordId) -> Result<CounterRecord> {
        let row = self.row(id)?;
        let _latch = row.latch.lock();
        row.ensure_attached()?;
        Ok(row.apply(|record| record.value = 0))
    }

    /// Removes a record, returning its last committed state.
    ///
    /// Waits for an open unit of work on the row to commit or abort. Writers
    /// queued on the row behind the removal fail with `NotFound`.
    pub fn remove(&self, id: RecordId) -> Result<CounterRecord> {
        let row = self.row(id)?;
        let _latch = row.latch.lock();
        row.ensure_attached()?;
        row.detached.store(true, Ordering::Relaxed);
        self.rows.write().remove(&id);
        let record = row.committed.read().clone();
        Ok(record)
    }

    fn row(&self, id: RecordId) -> Result<Arc<Row>> {
        self.rows
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }
}

impl ResourceStore for MemoryStore {
    type Unit = MemoryUnit;

    fn insert(&self, record: CounterRecord) -> Result<bool> {
        let mut rows = self.rows.write();
        if rows.contains_key(&record.id) {
            return Ok(false);
        }
        rows.insert(record.id, Arc::new(Row::new(record)));
        Ok(true)
    }

    fn acquire_exclusive(&self, id: RecordId) -> Result<MemoryUnit> {
        let row = self.row(id)?;
        let latch = row.latch.lock_arc();
        row.ensure_attached()?;
        let record = row.committed.read().clone();
        Ok(MemoryUnit {
            record,
            row,
            _latch: latch,
        })
    }

    fn read_versioned(&self, id: RecordId) -> Result<CounterRecord> {
        let row = self.row(id)?;
        let record = row.committed.read().clone();
        Ok(record)
    }

    fn write_versioned(&self, record: &CounterRecord) -> Result<VersionedWrite> {
        let row = self.row(record.id)?;
        let _latch = row.latch.lock();
        row.ensure_attached()?;
        let mut state = row.committed.write();
        if state.revision != record.revision {
            trace!(id = %record.id, expected = record.revision, found = state.revision, "revision moved");
            return Ok(VersionedWrite::Conflict {
                expected: record.revision,
                found: state.revision,
            });
        }
        *state = CounterRecord {
            revision: record.revision + 1,
            ..record.clone()
        };
        Ok(VersionedWrite::Applied(state.clone()))
    }

    fn increment_by_code(&self, code: &str) -> Result<usize> {
        // Full scan: there is no index on `code`.
        let rows: Vec<Arc<Row>> = self.rows.read().values().cloned().collect();
        let mut touched = 0;
        for row in rows {
            let _latch = row.latch.lock();
            if row.detached.load(Ordering::Relaxed) || !row.committed.read().has_code(code) {
                continue;
            }
            row.apply(|record| record.value = record.value.saturating_add(1));
            touched += 1;
        }
        Ok(touched)
    }

    fn sum_values(&self) -> Result<u64> {
        Ok(self
            .rows
            .read()
            .values()
            .map(|row| row.committed.read().value)
            .fold(0u64, u64::saturating_add))
    }
}

impl Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.rows.read();
        let mut ids: Vec<&RecordId> = rows.keys().collect();
        ids.sort();
        write!(f, "MemoryStore{{")?;
        for id in ids {
            write!(f, " {}", rows[id].committed.read())?;
        }
        write!(f, " }}")
    }
}

/// Exclusive unit of work over one [`MemoryStore`] row.
///
/// Owns the row latch; dropping the unit without committing releases the
/// latch and discards staged changes.
pub struct MemoryUnit {
    record: CounterRecord,
    row: Arc<Row>,
    _latch: ArcMutexGuard<RawMutex, ()>,
}

impl UnitOfWork for MemoryUnit {
    fn record(&self) -> &CounterRecord {
        &self.record
    }

    fn set_value(&mut self, value: u64) {
        self.record.value = value;
    }

    fn commit(self) -> Result<CounterRecord> {
        self.row.ensure_attached()?;
        let value = self.record.value;
        let committed = self.row.apply(|record| {
            debug_assert_eq!(record.revision, self.record.revision);
            record.value = value;
        });
        Ok(committed)
    }
}

impl Debug for MemoryUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryUnit")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}
