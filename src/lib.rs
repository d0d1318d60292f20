//! # Contesa - Concurrent Counter Update Strategies
//!
//! A small library that increments a shared counter record from many
//! threads at once, in four different ways, and measures what each way
//! does to the final total.
//!
//! ## The Problem
//!
//! A naive read-modify-write on a shared record loses updates: two callers
//! read value `v`, both write `v + 1`, and one increment disappears. Every
//! strategy below is a different answer to that race, with a different
//! price in throughput and correctness.
//!
//! ## Strategies
//!
//! | Strategy | Method | Loses increments? | How |
//! |----------|--------|-------------------|-----|
//! | Exclusive | [`increment_exclusive`](service::CounterService::increment_exclusive) | Never | Row latch held for the whole unit of work |
//! | Optimistic | [`increment_optimistic`](service::CounterService::increment_optimistic) | Yes, under contention | Compare-and-swap on `revision`, bounded retries, silent give-up |
//! | Fast | [`increment_fast`](service::CounterService::increment_fast) | Never | Single atomic add in a separate store |
//! | Unindexed | [`increment_by_unindexed_key`](service::CounterService::increment_by_unindexed_key) | Never | Full scan of every row matching a non-unique code |
//!
//! The optimistic strategy is deliberately lossy: once its retry budget is
//! spent it returns [`GaveUp`](service::OptimisticOutcome::GaveUp) instead
//! of an error. Every give-up is counted in
//! [`StrategyStats::optimistic_give_ups`](metrics::StrategyStats) and
//! logged at `warn`, so a caller can reconcile `expected - observed`.
//!
//! The unindexed strategy is a baseline for comparison. Its cost grows with
//! the number of records, not with contention.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌───────────────────────────┐
//!   load::run ──► │      CounterService       │ ──► StrategyStats
//!                 └───────────────────────────┘
//!                    │                     │
//!                    ▼                     ▼
//!          ResourceStore            FastIncrementStore
//!       (records + revisions)       (atomic per-id totals)
//!           MemoryStore               MemoryFastStore
//!       Flaky<_>, Lockstep<_>
//! ```
//!
//! The record store and the fast store are independent ledgers: an
//! increment on one never shows up in the other.
//!
//! ## Quick Start
//!
//! ```rust
//! use contesa::record::{CounterRecord, RecordId};
//! use contesa::service::CounterService;
//! use contesa::store::{MemoryFastStore, MemoryStore, ResourceStore};
//! use std::sync::Arc;
//!
//! let records = Arc::new(MemoryStore::new());
//! let id = RecordId::new(1);
//! records.insert(CounterRecord::new(id).with_code("post-1")).unwrap();
//!
//! let service = CounterService::new(records, Arc::new(MemoryFastStore::new()));
//!
//! service.increment_exclusive(id).unwrap();
//! service.increment_optimistic(id).unwrap();
//! service.increment_by_unindexed_key("post-1").unwrap();
//! service.increment_fast(id).unwrap();
//!
//! let record = service.records().read_versioned(id).unwrap();
//! assert_eq!(record.value, 3);
//! assert_eq!(record.revision, 3);
//! assert_eq!(service.fast_value(id).unwrap(), 1);
//! ```
//!
//! ## Testing Under Contention
//!
//! The [`adapters`] module wraps any store to make contention tests
//! reproducible: [`Lockstep`](adapters::Lockstep) forces optimistic callers
//! into deterministic rounds and [`Flaky`](adapters::Flaky) injects store
//! failures.
//!
//! ## Observers
//!
//! Load reports and tallies can be exported in various formats. Each
//! observer is gated behind a feature flag:
//!
//! | Feature | Module | Description |
//! |---------|--------|-------------|
//! | `table` | [`observers::table`] | Pretty-print a strategy comparison |
//! | `json` | [`observers::json`] | Serialize reports and tallies to JSON |
//! | `full` | All observers | Enables all observer modules |
//!
//! ```rust,ignore
//! use contesa::load::{self, LoadPlan, Strategy};
//! use contesa::observers::table::TableObserver;
//!
//! let reports = Strategy::ALL
//!     .iter()
//!     .map(|&s| load::run(&service, id, s, LoadPlan::new()))
//!     .collect::<Result<Vec<_>, _>>()?;
//! println!("{}", TableObserver::new().render_reports(&reports));
//! ```

pub mod adapters;
pub mod error;
pub mod load;
pub mod metrics;
pub mod observers;
pub mod record;
pub mod service;
pub mod store;

#[cfg(feature = "serde")]
pub mod snapshot;
