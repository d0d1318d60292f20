//! Concurrent load driver.
//!
//! Fires a fixed number of increment requests at one record through a pool
//! of worker threads and compares the total the store ends up with against
//! the total that was asked for.
//!
//! ```text
//!   ┌──────────┐   tickets   ┌──────────┐
//!   │ requests │ ──────────► │ worker 0 │ ──┐
//!   │ counter  │ ──────────► │ worker 1 │ ──┤──► CounterService ──► stores
//!   │          │ ──────────► │   ...    │ ──┘
//!   └──────────┘             └──────────┘
//!                 before/after readback ──► LoadReport
//! ```
//!
//! Failed calls are counted and the run continues; a failure while taking
//! the before/after readings aborts the run.

use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::Result;
use crate::record::RecordId;
use crate::service::{CounterService, OptimisticOutcome};
use crate::store::{FastIncrementStore, ResourceStore};

/// The update path a load run exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Strategy {
    /// [`CounterService::increment_exclusive`].
    Exclusive,
    /// [`CounterService::increment_optimistic`].
    Optimistic,
    /// [`CounterService::increment_fast`].
    Fast,
    /// [`CounterService::increment_by_unindexed_key`] with the record's code.
    Unindexed,
}

impl Strategy {
    /// Every strategy, in presentation order.
    pub const ALL: [Strategy; 4] = [
        Strategy::Exclusive,
        Strategy::Optimistic,
        Strategy::Fast,
        Strategy::Unindexed,
    ];

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Exclusive => "exclusive",
            Strategy::Optimistic => "optimistic",
            Strategy::Fast => "fast",
            Strategy::Unindexed => "unindexed",
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a load run.
///
/// # Examples
///
/// ```rust
/// use contesa::load::LoadPlan;
///
/// let plan = LoadPlan::new().with_workers(8).with_requests(1_000);
/// assert_eq!((plan.workers, plan.requests), (8, 1_000));
/// assert_eq!(LoadPlan::default().requests, 10_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadPlan {
    /// Worker threads issuing requests. At least one is always used.
    pub workers: usize,
    /// Total requests across all workers.
    pub requests: usize,
}

impl LoadPlan {
    /// Default pool size.
    pub const DEFAULT_WORKERS: usize = 100;
    /// Default request count.
    pub const DEFAULT_REQUESTS: usize = 10_000;

    /// Default plan: 100 workers, 10 000 requests.
    pub const fn new() -> Self {
        Self {
            workers: Self::DEFAULT_WORKERS,
            requests: Self::DEFAULT_REQUESTS,
        }
    }

    /// Sets the pool size.
    pub const fn with_workers(self, workers: usize) -> Self {
        Self { workers, ..self }
    }

    /// Sets the request count.
    pub const fn with_requests(self, requests: usize) -> Self {
        Self { requests, ..self }
    }
}

impl Default for LoadPlan {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one load run: expected vs observed totals.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadReport {
    /// Strategy exercised.
    pub strategy: Strategy,
    /// Worker threads used.
    pub workers: usize,
    /// Requests issued.
    pub requests: usize,
    /// Increments the run asked for.
    ///
    /// One per request, except for [`Strategy::Unindexed`] where each call
    /// asks for one per matching row.
    pub expected: u64,
    /// Increments the store actually gained during the run.
    pub observed: u64,
    /// Optimistic calls that gave up.
    pub give_ups: u64,
    /// Calls that returned an error.
    pub errors: u64,
    /// Wall time spent issuing requests.
    pub elapsed: Duration,
}

impl LoadReport {
    /// Increments asked for but not observed.
    pub fn lost(&self) -> u64 {
        self.expected.saturating_sub(self.observed)
    }

    /// Requests per second over the run.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.requests as f64 / secs
        } else {
            0.0
        }
    }
}

impl Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} requests on {} workers in {}ms, expected {}, observed {}, lost {} (give-ups {}, errors {})",
            self.strategy,
            self.requests,
            self.workers,
            self.elapsed.as_millis(),
            self.expected,
            self.observed,
            self.lost(),
            self.give_ups,
            self.errors
        )
    }
}

/// Runs `plan.requests` calls of `strategy` against record `id`.
///
/// The observed total is read before and after the run: the durable
/// record's value for [`Strategy::Exclusive`] and [`Strategy::Optimistic`],
/// the fast-store entry for [`Strategy::Fast`], and the store-wide sum for
/// [`Strategy::Unindexed`]. The record must exist; for
/// [`Strategy::Unindexed`] a record without a code matches nothing, so the
/// run reports zero expected and zero observed increments.
///
/// # Examples
///
/// ```rust
/// use contesa::load::{self, LoadPlan, Strategy};
/// use contesa::record::{CounterRecord, RecordId};
/// use contesa::service::CounterService;
/// use contesa::store::{MemoryFastStore, MemoryStore, ResourceStore};
/// use std::sync::Arc;
///
/// let records = Arc::new(MemoryStore::new());
/// let id = RecordId::new(1);
/// records.insert(CounterRecord::new(id)).unwrap();
/// let service = CounterService::new(records, Arc::new(MemoryFastStore::new()));
///
/// let plan = LoadPlan::new().with_workers(8).with_requests(400);
/// let report = load::run(&service, id, Strategy::Exclusive, plan).unwrap();
///
/// assert_eq!(report.expected, 400);
/// assert_eq!(report.observed, 400);
/// assert_eq!(report.lost(), 0);
/// ```
pub fn run<R, F>(
    service: &CounterService<R, F>,
    id: RecordId,
    strategy: Strategy,
    plan: LoadPlan,
) -> Result<LoadReport>
where
    R: ResourceStore,
    F: FastIncrementStore,
{
    let code = service.records().read_versioned(id)?.code.unwrap_or_default();
    let before = reading(service, id, strategy)?;

    let tickets = AtomicUsize::new(0);
    let expected = AtomicU64::new(0);
    let give_ups = AtomicU64::new(0);
    let errors = AtomicU64::new(0);

    info!(%strategy, workers = plan.workers, requests = plan.requests, "load run started");
    let start = Instant::now();

    thread::scope(|s| {
        for _ in 0..plan.workers.max(1) {
            s.spawn(|| {
                while tickets.fetch_add(1, Ordering::Relaxed) < plan.requests {
                    let asked = match strategy {
                        Strategy::Exclusive => service.increment_exclusive(id).map(|_| 1),
                        Strategy::Optimistic => service.increment_optimistic(id).map(|outcome| {
                            if let OptimisticOutcome::GaveUp { .. } = outcome {
                                give_ups.fetch_add(1, Ordering::Relaxed);
                            }
                            1
                        }),
                        Strategy::Fast => service.increment_fast(id).map(|_| 1),
                        Strategy::Unindexed => service
                            .increment_by_unindexed_key(&code)
                            .map(|touched| touched as u64),
                    };
                    match asked {
                        Ok(n) => {
                            expected.fetch_add(n, Ordering::Relaxed);
                        }
                        Err(err) => {
                            errors.fetch_add(1, Ordering::Relaxed);
                            warn!(%strategy, %err, "request failed");
                        }
                    }
                }
            });
        }
    });

    let elapsed = start.elapsed();
    let after = reading(service, id, strategy)?;

    let report = LoadReport {
        strategy,
        workers: plan.workers.max(1),
        requests: plan.requests,
        expected: expected.into_inner(),
        observed: after.saturating_sub(before),
        give_ups: give_ups.into_inner(),
        errors: errors.into_inner(),
        elapsed,
    };
    info!(%report, "load run finished");
    Ok(report)
}

fn reading<R, F>(service: &CounterService<R, F>, id: RecordId, strategy: Strategy) -> Result<u64>
where
    R: ResourceStore,
    F: FastIncrementStore,
{
    match strategy {
        Strategy::Exclusive | Strategy::Optimistic => {
            Ok(service.records().read_versioned(id)?.value)
        }
        Strategy::Fast => service.fast_value(id),
        Strategy::Unindexed => service.records().sum_values(),
    }
}
