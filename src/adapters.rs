//! Store wrappers for exercising the service under adverse conditions.
//!
//! Both wrappers implement the store traits by delegating to an inner
//! store, so they slot into [`CounterService`](crate::service::CounterService)
//! unchanged.
//!
//! | Wrapper | Wraps | Adds |
//! |---------|-------|------|
//! | [`Flaky`] | either store | outages and failed commits ([`StoreError::Transient`](crate::error::StoreError::Transient)) |
//! | [`Lockstep`] | [`ResourceStore`](crate::store::ResourceStore) | deterministic contention between optimistic callers |
//!
//! # Example
//!
//! ```rust
//! use contesa::adapters::Flaky;
//! use contesa::record::{CounterRecord, RecordId};
//! use contesa::service::CounterService;
//! use contesa::store::{MemoryFastStore, MemoryStore, ResourceStore};
//! use std::sync::Arc;
//!
//! let records = Arc::new(Flaky::new(MemoryStore::new()));
//! records.insert(CounterRecord::new(RecordId::new(1))).unwrap();
//! let service = CounterService::new(Arc::clone(&records), Arc::new(MemoryFastStore::new()));
//!
//! records.go_offline();
//! assert!(service.increment_exclusive(RecordId::new(1)).unwrap_err().is_transient());
//! ```

mod flaky;
mod lockstep;

pub use flaky::{Flaky, FlakyUnit};
pub use lockstep::Lockstep;
