//! JSON observer for load reports and tallies.
//!
//! # Feature Flag
//!
//! This module requires the `json` feature:
//!
//! ```toml
//! [dependencies]
//! contesa = { version = "0.1", features = ["json"] }
//! ```
//!
//! # Output
//!
//! ```text
//! {
//!   "timestamp_ms": 1760601600000,
//!   "reports": [
//!     { "strategy": "optimistic", "workers": 100, "requests": 10000,
//!       "expected": 10000, "observed": 9377, "give_ups": 623, "errors": 0,
//!       "elapsed": { "secs": 0, "nanos": 18000000 } }
//!   ],
//!   "stats": { "tallies": [ { "name": "exclusive_applied", "value": 0 }, ... ] }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::load::LoadReport;
use crate::metrics::StrategyStats;
use crate::observers::error::now_ms;
use crate::observers::Result;
use crate::snapshot::StatsSnapshot;

/// Everything a run produced, in one serializable document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// Milliseconds since the Unix epoch, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    /// One entry per load run.
    pub reports: Vec<LoadReport>,
    /// Service tallies after the runs.
    pub stats: StatsSnapshot,
}

/// Configuration for the JSON observer.
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Indent the output.
    pub pretty: bool,
    /// Stamp the summary with the current time.
    pub include_timestamp: bool,
}

/// Serializes load reports and tallies to JSON.
///
/// # Examples
///
/// ```rust
/// use contesa::metrics::StrategyStats;
/// use contesa::observers::json::JsonObserver;
///
/// let stats = StrategyStats::new();
/// stats.fast_applied.add(2);
///
/// let json = JsonObserver::new().stats_to_json(&stats).unwrap();
/// assert!(json.contains(r#"{"name":"fast_applied","value":2}"#));
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonObserver {
    config: JsonConfig,
}

impl JsonObserver {
    /// Creates a JSON observer producing compact output without a timestamp.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a JSON observer with the specified configuration.
    pub fn with_config(config: JsonConfig) -> Self {
        Self { config }
    }

    /// Enables or disables indented output.
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.config.pretty = enabled;
        self
    }

    /// Enables or disables the timestamp.
    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.config.include_timestamp = enabled;
        self
    }

    fn stamp(&self) -> Result<Option<u64>> {
        if self.config.include_timestamp {
            Ok(Some(now_ms()?))
        } else {
            Ok(None)
        }
    }

    fn serialize<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.config.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }

    /// Builds the summary document without serializing it.
    pub fn summarize(&self, reports: &[LoadReport], stats: &StrategyStats) -> Result<RunSummary> {
        Ok(RunSummary {
            timestamp_ms: self.stamp()?,
            reports: reports.to_vec(),
            stats: StatsSnapshot::capture(stats),
        })
    }

    /// Serializes reports and tallies as one [`RunSummary`].
    pub fn to_json(&self, reports: &[LoadReport], stats: &StrategyStats) -> Result<String> {
        self.serialize(&self.summarize(reports, stats)?)
    }

    /// Serializes the load reports as a JSON array.
    pub fn reports_to_json(&self, reports: &[LoadReport]) -> Result<String> {
        self.serialize(&reports)
    }

    /// Serializes the tallies as a [`StatsSnapshot`].
    pub fn stats_to_json(&self, stats: &StrategyStats) -> Result<String> {
        let mut snapshot = StatsSnapshot::capture(stats);
        snapshot.timestamp_ms = self.stamp()?;
        self.serialize(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::Strategy;
    use std::time::Duration;

    fn report() -> LoadReport {
        LoadReport {
            strategy: Strategy::Optimistic,
            workers: 4,
            requests: 10,
            expected: 10,
            observed: 8,
            give_ups: 2,
            errors: 0,
            elapsed: Duration::from_millis(3),
        }
    }

    #[test]
    fn test_reports_to_json() {
        let json = JsonObserver::new().reports_to_json(&[report()]).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains(r#""strategy":"optimistic""#));
        assert!(json.contains(r#""give_ups":2"#));
    }

    #[test]
    fn test_stats_without_timestamp() {
        let json = JsonObserver::new().stats_to_json(&StrategyStats::new()).unwrap();
        assert!(!json.contains("timestamp_ms"));
        assert!(json.contains(r#"{"name":"failures","value":0}"#));
    }

    #[test]
    fn test_stats_with_timestamp() {
        let json = JsonObserver::new()
            .with_timestamp(true)
            .stats_to_json(&StrategyStats::new())
            .unwrap();
        assert!(json.contains("timestamp_ms"));
    }

    #[test]
    fn test_pretty() {
        let json = JsonObserver::new()
            .pretty(true)
            .stats_to_json(&StrategyStats::new())
            .unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("  "));
    }

    #[test]
    fn test_summary_roundtrip() {
        let stats = StrategyStats::new();
        stats.optimistic_give_ups.add(2);
        let observer = JsonObserver::new().with_timestamp(true);

        let json = observer.to_json(&[report()], &stats).unwrap();
        let summary: RunSummary = serde_json::from_str(&json).unwrap();

        assert!(summary.timestamp_ms.is_some());
        assert_eq!(summary.reports, vec![report()]);
        assert_eq!(summary.stats.get("optimistic_give_ups"), Some(2));
    }

    #[test]
    fn test_summarize_does_not_reset() {
        let stats = StrategyStats::new();
        stats.fast_applied.add(9);
        let summary = JsonObserver::new().summarize(&[], &stats).unwrap();
        assert_eq!(summary.stats.get("fast_applied"), Some(9));
        assert_eq!(StatsSnapshot::capture(&stats).get("fast_applied"), Some(9));
    }
}
