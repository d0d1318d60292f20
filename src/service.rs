//! The counter update service.
//!
//! [`CounterService`] increments a shared view count through four
//! strategies with very different behaviour under contention:
//!
//! | Method | Mechanism | Under contention |
//! |--------|-----------|------------------|
//! | [`increment_exclusive`](CounterService::increment_exclusive) | exclusive unit of work | queues; never loses |
//! | [`increment_optimistic`](CounterService::increment_optimistic) | versioned check-and-set, bounded retry | spins; may silently give up |
//! | [`increment_fast`](CounterService::increment_fast) | atomic increment in the fast store | never blocks, never loses |
//! | [`increment_by_unindexed_key`](CounterService::increment_by_unindexed_key) | full-scan store-side update | baseline only, do not use |
//!
//! The durable record and the fast-store entry are separate ledgers: the
//! service never copies one into the other.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{Result, StoreError};
use crate::metrics::StrategyStats;
use crate::record::{CounterRecord, RecordId};
use crate::store::{FastIncrementStore, ResourceStore, UnitOfWork, VersionedWrite};

/// Tunables for [`CounterService`].
///
/// # Examples
///
/// ```rust
/// use contesa::service::ServiceConfig;
///
/// const CONFIG: ServiceConfig = ServiceConfig::new().with_max_retries(10);
/// assert_eq!(CONFIG.max_retries, 10);
/// assert_eq!(ServiceConfig::default().max_retries, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Attempts made by the optimistic strategy before giving up.
    ///
    /// Fixed, with no delay between attempts. Zero means every optimistic
    /// call gives up without touching the store.
    pub max_retries: usize,
}

impl ServiceConfig {
    /// Attempts per optimistic call unless configured otherwise.
    pub const DEFAULT_MAX_RETRIES: usize = 5;

    /// Default configuration.
    pub const fn new() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the optimistic attempt bound.
    pub const fn with_max_retries(self, max_retries: usize) -> Self {
        Self { max_retries }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened to one optimistic increment.
///
/// Giving up is not an error: the call succeeds without applying the
/// increment. It is reported here and in
/// [`StrategyStats::optimistic_give_ups`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimisticOutcome {
    /// The increment landed on the given attempt (1-based).
    Applied {
        /// Stored record after the write.
        record: CounterRecord,
        /// Attempts used, including the successful one.
        attempts: usize,
    },
    /// Every attempt lost its race; the increment was dropped.
    GaveUp {
        /// Attempts made, all conflicting.
        attempts: usize,
    },
}

impl OptimisticOutcome {
    /// Returns `true` if the increment landed.
    pub fn is_applied(&self) -> bool {
        matches!(self, OptimisticOutcome::Applied { .. })
    }

    /// Attempts made.
    pub fn attempts(&self) -> usize {
        match self {
            OptimisticOutcome::Applied { attempts, .. } | OptimisticOutcome::GaveUp { attempts } => {
                *attempts
            }
        }
    }
}

/// Increments shared counters through interchangeable concurrency strategies.
///
/// Store handles are injected at construction; the service holds no other
/// shared state besides its own [`StrategyStats`]. It is `Sync` whenever the
/// stores are, so one instance can be shared by reference across workers.
///
/// # Examples
///
/// ```rust
/// use contesa::record::{CounterRecord, RecordId};
/// use contesa::service::CounterService;
/// use contesa::store::{MemoryFastStore, MemoryStore, ResourceStore};
/// use std::sync::Arc;
///
/// let records = Arc::new(MemoryStore::new());
/// let id = RecordId::new(1);
/// records.insert(CounterRecord::new(id)).unwrap();
///
/// let service = CounterService::new(records, Arc::new(MemoryFastStore::new()));
///
/// assert_eq!(service.increment_exclusive(id).unwrap().value, 1);
/// assert!(service.increment_optimistic(id).unwrap().is_applied());
/// assert_eq!(service.increment_fast(id).unwrap(), 1);
///
/// // Two ledgers: the fast store knows nothing about the durable value.
/// assert_eq!(service.records().read_versioned(id).unwrap().value, 2);
/// assert_eq!(service.fast_value(id).unwrap(), 1);
/// ```
pub struct CounterService<R, F> {
    records: Arc<R>,
    fast: Arc<F>,
    config: ServiceConfig,
    stats: StrategyStats,
}

impl<R: ResourceStore, F: FastIncrementStore> CounterService<R, F> {
    /// Creates a service over the given stores with the default configuration.
    pub fn new(records: Arc<R>, fast: Arc<F>) -> Self {
        Self {
            records,
            fast,
            config: ServiceConfig::default(),
            stats: StrategyStats::new(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(self, config: ServiceConfig) -> Self {
        Self { config, ..self }
    }

    /// Current configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The durable record store.
    pub fn records(&self) -> &Arc<R> {
        &self.records
    }

    /// The fast increment store.
    pub fn fast_store(&self) -> &Arc<F> {
        &self.fast
    }

    /// Tallies of what each strategy did.
    pub fn stats(&self) -> &StrategyStats {
        &self.stats
    }

    /// Increments under an exclusive lock held until commit.
    ///
    /// Concurrent callers on the same identity queue behind each other;
    /// every successful call is reflected exactly once. If the commit fails
    /// the unit is abandoned and nothing is written.
    pub fn increment_exclusive(&self, id: RecordId) -> Result<CounterRecord> {
        let result = self.records.acquire_exclusive(id).and_then(|mut unit| {
            let next = unit.record().value.saturating_add(1);
            unit.set_value(next);
            unit.commit()
        });
        let record = self.observe(id, result)?;
        debug!(%id, value = record.value, revision = record.revision, "exclusive increment committed");
        self.stats.exclusive_applied.incr();
        Ok(record)
    }

    /// Increments with versioned check-and-set, retrying up to
    /// [`ServiceConfig::max_retries`] times.
    ///
    /// See [`increment_optimistic_with`](Self::increment_optimistic_with).
    pub fn increment_optimistic(&self, id: RecordId) -> Result<OptimisticOutcome> {
        self.increment_optimistic_with(id, self.config.max_retries)
    }

    /// Increments with versioned check-and-set, retrying up to `max_retries`
    /// times with no delay.
    ///
    /// A conflict discards the stale copy and re-reads. When every attempt
    /// conflicts the increment is dropped and the call still returns `Ok`
    /// with [`OptimisticOutcome::GaveUp`]; the drop is logged and counted in
    /// [`StrategyStats::optimistic_give_ups`]. A missing record fails
    /// immediately and is not retried.
    pub fn increment_optimistic_with(
        &self,
        id: RecordId,
        max_retries: usize,
    ) -> Result<OptimisticOutcome> {
        for attempt in 1..=max_retries {
            let current = self.observe(id, self.records.read_versioned(id))?;
            let write = self.observe(id, self.records.write_versioned(&current.incremented()))?;
            match write {
                VersionedWrite::Applied(record) => {
                    self.stats.optimistic_applied.incr();
                    return Ok(OptimisticOutcome::Applied {
                        record,
                        attempts: attempt,
                    });
                }
                VersionedWrite::Conflict { expected, found } => {
                    self.stats.optimistic_conflicts.incr();
                    trace!(%id, attempt, expected, found, "version conflict, retrying");
                }
            }
        }

        self.stats.optimistic_give_ups.incr();
        warn!(%id, attempts = max_retries, "optimistic increment dropped after exhausting retries");
        Ok(OptimisticOutcome::GaveUp {
            attempts: max_retries,
        })
    }

    /// Increments the fast-store entry and returns its new value.
    ///
    /// The durable record is not read or written.
    pub fn increment_fast(&self, id: RecordId) -> Result<u64> {
        let value = self.observe(id, self.fast.atomic_increment(id))?;
        self.stats.fast_applied.incr();
        Ok(value)
    }

    /// Increments every record carrying `code`, through a store-side full
    /// scan with no version check.
    ///
    /// Kept as a benchmark baseline for the cost of updating through a
    /// non-indexed, non-unique key. It bypasses optimistic conflict
    /// detection on the caller's side and should not be used by
    /// applications. Returns the number of rows touched.
    pub fn increment_by_unindexed_key(&self, code: &str) -> Result<usize> {
        let touched = self.records.increment_by_code(code).inspect_err(|err| {
            self.stats.failures.incr();
            warn!(code, %err, "unindexed update failed");
        })?;
        debug!(code, touched, "unindexed update applied");
        self.stats.unindexed_rows.add(touched as u64);
        Ok(touched)
    }

    /// Reads the fast-store entry for `id` (zero when absent).
    pub fn fast_value(&self, id: RecordId) -> Result<u64> {
        self.fast.get(id)
    }

    /// Counts and logs an error on its way to the caller.
    fn observe<T>(&self, id: RecordId, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.stats.failures.incr();
            match err {
                StoreError::NotFound(_) => debug!(%id, "record not found"),
                StoreError::Transient(reason) => {
                    warn!(%id, reason = reason.as_str(), "store failure surfaced to caller")
                }
            }
        }
        result
    }
}
