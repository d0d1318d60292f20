//! Renderers for load reports and service tallies.
//!
//! - [`table`] - Pretty-print a strategy comparison using the `tabled` crate
//! - [`json`] - Serialize reports and tallies to JSON
//!
//! # Feature Flags
//!
//! - `table` - Enables the [`table`] module
//! - `json` - Enables the [`json`] module
//! - `full` - Enables both
//!
//! All fallible observer operations share [`ObserverError`].
//!
//! # Example
//!
//! ```rust,ignore
//! use contesa::load::{self, LoadPlan, Strategy};
//! use contesa::observers::json::JsonObserver;
//! use contesa::observers::table::TableObserver;
//!
//! let reports = vec![load::run(&service, id, Strategy::Exclusive, LoadPlan::new())?];
//!
//! println!("{}", TableObserver::new().render_reports(&reports));
//! println!("{}", JsonObserver::new().pretty(true).to_json(&reports, service.stats())?);
//! ```

mod error;

pub use error::{ObserverError, Result};

#[cfg(feature = "table")]
pub mod table;

#[cfg(feature = "json")]
pub mod json;
