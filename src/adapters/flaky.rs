//! Failure injection for either store.

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Result, StoreError};
use crate::record::{CounterRecord, RecordId};
use crate::store::{FastIncrementStore, ResourceStore, UnitOfWork, VersionedWrite};

#[derive(Debug, Default)]
struct Faults {
    offline: AtomicBool,
    failing_commits: AtomicUsize,
}

impl Faults {
    fn check(&self) -> Result<()> {
        if self.offline.load(Ordering::Acquire) {
            return Err(StoreError::transient("store offline"));
        }
        Ok(())
    }

    /// Consumes one pending commit failure, if any.
    fn take_commit_failure(&self) -> bool {
        self.failing_commits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// A store wrapper that fails on demand.
///
/// While offline every operation returns [`StoreError::Transient`] without
/// reaching the inner store. [`fail_next_commits`](Self::fail_next_commits)
/// makes the next commits of exclusive units fail after the lock was taken,
/// which aborts the unit.
///
/// # Example
///
/// ```rust
/// use contesa::adapters::Flaky;
/// use contesa::record::RecordId;
/// use contesa::store::{FastIncrementStore, MemoryFastStore};
///
/// let fast = Flaky::new(MemoryFastStore::new());
/// fast.go_offline();
/// assert!(fast.atomic_increment(RecordId::new(1)).is_err());
/// fast.go_online();
/// assert_eq!(fast.atomic_increment(RecordId::new(1)).unwrap(), 1);
/// ```
pub struct Flaky<S> {
    inner: S,
    faults: Arc<Faults>,
}

impl<S> Flaky<S> {
    /// Wraps `inner`, initially online.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Arc::new(Faults::default()),
        }
    }

    /// Makes every subsequent operation fail.
    pub fn go_offline(&self) {
        self.faults.offline.store(true, Ordering::Release);
    }

    /// Restores normal operation.
    pub fn go_online(&self) {
        self.faults.offline.store(false, Ordering::Release);
    }

    /// Returns `true` while offline.
    pub fn is_offline(&self) -> bool {
        self.faults.offline.load(Ordering::Acquire)
    }

    /// Makes the next `n` unit-of-work commits fail.
    pub fn fail_next_commits(&self, n: usize) {
        self.faults.failing_commits.store(n, Ordering::Release);
    }

    /// Returns a reference to the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwraps, returning the inner store.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ResourceStore> ResourceStore for Flaky<S> {
    type Unit = FlakyUnit<S::Unit>;

    fn insert(&self, record: CounterRecord) -> Result<bool> {
        self.faults.check()?;
        self.inner.insert(record)
    }

    fn acquire_exclusive(&self, id: RecordId) -> Result<Self::Unit> {
        self.faults.check()?;
        Ok(FlakyUnit {
            inner: self.inner.acquire_exclusive(id)?,
            faults: Arc::clone(&self.faults),
        })
    }

    fn read_versioned(&self, id: RecordId) -> Result<CounterRecord> {
        self.faults.check()?;
        self.inner.read_versioned(id)
    }

    fn write_versioned(&self, record: &CounterRecord) -> Result<VersionedWrite> {
        self.faults.check()?;
        self.inner.write_versioned(record)
    }

    fn increment_by_code(&self, code: &str) -> Result<usize> {
        self.faults.check()?;
        self.inner.increment_by_code(code)
    }

    fn sum_values(&self) -> Result<u64> {
        self.faults.check()?;
        self.inner.sum_values()
    }
}

impl<S: FastIncrementStore> FastIncrementStore for Flaky<S> {
    fn atomic_increment(&self, id: RecordId) -> Result<u64> {
        self.faults.check()?;
        self.inner.atomic_increment(id)
    }

    fn get(&self, id: RecordId) -> Result<u64> {
        self.faults.check()?;
        self.inner.get(id)
    }

    fn sum(&self) -> Result<u64> {
        self.faults.check()?;
        self.inner.sum()
    }
}

impl<S: Debug> Debug for Flaky<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flaky")
            .field("inner", &self.inner)
            .field("offline", &self.is_offline())
            .finish()
    }
}

/// Unit of work whose commit can be made to fail.
///
/// A failed commit drops the inner unit uncommitted, so the inner store
/// aborts it and releases its lock.
pub struct FlakyUnit<U> {
    inner: U,
    faults: Arc<Faults>,
}

impl<U: UnitOfWork> UnitOfWork for FlakyUnit<U> {
    fn record(&self) -> &CounterRecord {
        self.inner.record()
    }

    fn set_value(&mut self, value: u64) {
        self.inner.set_value(value);
    }

    fn commit(self) -> Result<CounterRecord> {
        self.faults.check()?;
        if self.faults.take_commit_failure() {
            return Err(StoreError::transient("commit failed"));
        }
        self.inner.commit()
    }
}

impl<U: Debug> Debug for FlakyUnit<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FlakyUnit").field(&self.inner).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryFastStore, MemoryStore};

    fn flaky_with(id: RecordId) -> Flaky<MemoryStore> {
        let store = Flaky::new(MemoryStore::new());
        store.insert(CounterRecord::new(id)).unwrap();
        store
    }

    #[test]
    fn test_online_delegates() {
        let id = RecordId::new(1);
        let store = flaky_with(id);
        assert!(store.write_versioned(&CounterRecord::new(id).incremented()).unwrap().is_applied());
        assert_eq!(store.read_versioned(id).unwrap().value, 1);
        assert_eq!(store.inner().len(), 1);
    }

    #[test]
    fn test_offline_fails_every_operation() {
        let id = RecordId::new(1);
        let store = flaky_with(id);
        store.go_offline();
        assert!(store.is_offline());
        assert!(store.read_versioned(id).unwrap_err().is_transient());
        assert!(store.acquire_exclusive(id).unwrap_err().is_transient());
        assert!(store.increment_by_code("x").unwrap_err().is_transient());
        assert!(store.sum_values().unwrap_err().is_transient());
        assert!(store.insert(CounterRecord::new(RecordId::new(2))).unwrap_err().is_transient());

        store.go_online();
        assert_eq!(store.read_versioned(id).unwrap().revision, 0);
    }

    #[test]
    fn test_failed_commit_aborts_unit() {
        let id = RecordId::new(1);
        let store = flaky_with(id);
        store.fail_next_commits(2);

        for _ in 0..2 {
            let mut unit = store.acquire_exclusive(id).unwrap();
            unit.set_value(5);
            assert_eq!(unit.commit(), Err(StoreError::transient("commit failed")));
        }

        let record = store.read_versioned(id).unwrap();
        assert_eq!((record.value, record.revision), (0, 0));

        let mut unit = store.acquire_exclusive(id).unwrap();
        unit.set_value(5);
        assert_eq!(unit.commit().unwrap().revision, 1);
    }

    #[test]
    fn test_outage_between_acquire_and_commit() {
        let id = RecordId::new(1);
        let store = flaky_with(id);
        let unit = store.acquire_exclusive(id).unwrap();
        store.go_offline();
        assert!(unit.commit().unwrap_err().is_transient());
        store.go_online();
        assert_eq!(store.read_versioned(id).unwrap().revision, 0);
    }

    #[test]
    fn test_fast_store() {
        let fast = Flaky::new(MemoryFastStore::new());
        let id = RecordId::new(1);
        fast.atomic_increment(id).unwrap();
        fast.go_offline();
        assert!(fast.get(id).unwrap_err().is_transient());
        assert!(fast.sum().unwrap_err().is_transient());
        fast.go_online();
        assert_eq!(fast.into_inner().get(id).unwrap(), 1);
    }
}
