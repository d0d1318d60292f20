//! Serializable point-in-time copies of the service tallies.
//!
//! # Feature Flag
//!
//! This module requires the `serde` feature:
//!
//! ```toml
//! [dependencies]
//! contesa = { version = "0.1", features = ["serde"] }
//! ```

use serde::{Deserialize, Serialize};

use crate::metrics::{Observable, StrategyStats};

/// One tally's name and value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TallySnapshot {
    /// Tally name, `(unnamed)` when empty.
    pub name: String,
    /// Value at capture time.
    pub value: u64,
}

impl TallySnapshot {
    /// Creates a snapshot entry.
    pub fn new(name: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Captures an observable's current value.
    pub fn from_observable(tally: &dyn Observable) -> Self {
        Self::new(display_name(tally), tally.value())
    }

    /// Captures an observable's value and resets it.
    pub fn from_observable_and_reset(tally: &dyn Observable) -> Self {
        Self::new(display_name(tally), tally.value_and_reset())
    }
}

fn display_name(tally: &dyn Observable) -> String {
    if tally.name().is_empty() {
        "(unnamed)".to_string()
    } else {
        tally.name().to_string()
    }
}

/// All tallies of a [`StrategyStats`] at one instant.
///
/// # Examples
///
/// ```rust
/// use contesa::metrics::StrategyStats;
/// use contesa::snapshot::StatsSnapshot;
///
/// let stats = StrategyStats::new();
/// stats.optimistic_give_ups.add(3);
///
/// let snapshot = StatsSnapshot::capture(&stats);
/// assert_eq!(snapshot.get("optimistic_give_ups"), Some(3));
/// assert_eq!(snapshot.get("no_such_tally"), None);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Milliseconds since the Unix epoch, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    /// The captured tallies.
    pub tallies: Vec<TallySnapshot>,
}

impl StatsSnapshot {
    /// Wraps already captured entries.
    pub fn new(tallies: Vec<TallySnapshot>) -> Self {
        Self {
            timestamp_ms: None,
            tallies,
        }
    }

    /// Attaches a timestamp.
    pub fn with_timestamp(self, timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms: Some(timestamp_ms),
            ..self
        }
    }

    /// Captures every tally of `stats`.
    pub fn capture(stats: &StrategyStats) -> Self {
        Self::collect(stats.observables().into_iter())
    }

    /// Captures every tally of `stats` and resets them.
    pub fn capture_and_reset(stats: &StrategyStats) -> Self {
        Self::new(
            stats
                .observables()
                .into_iter()
                .map(TallySnapshot::from_observable_and_reset)
                .collect(),
        )
    }

    /// Captures an arbitrary set of observables.
    pub fn collect<'a>(tallies: impl Iterator<Item = &'a dyn Observable>) -> Self {
        Self::new(tallies.map(TallySnapshot::from_observable).collect())
    }

    /// Value of the tally named `name`.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.tallies.iter().find(|t| t.name == name).map(|t| t.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Tally;

    #[test]
    fn test_capture() {
        let stats = StrategyStats::new();
        stats.exclusive_applied.add(10);
        let snapshot = StatsSnapshot::capture(&stats);
        assert_eq!(snapshot.tallies.len(), 7);
        assert_eq!(snapshot.get("exclusive_applied"), Some(10));
        assert!(snapshot.timestamp_ms.is_none());
    }

    #[test]
    fn test_capture_and_reset() {
        let stats = StrategyStats::new();
        stats.fast_applied.add(4);
        let snapshot = StatsSnapshot::capture_and_reset(&stats);
        assert_eq!(snapshot.get("fast_applied"), Some(4));
        assert_eq!(stats.fast_applied.value(), 0);
    }

    #[test]
    fn test_unnamed_tally() {
        let tally = Tally::new();
        tally.incr();
        let entry = TallySnapshot::from_observable(&tally);
        assert_eq!(entry, TallySnapshot::new("(unnamed)", 1));
    }

    #[test]
    fn test_serialize() {
        let snapshot =
            StatsSnapshot::new(vec![TallySnapshot::new("failures", 2)]).with_timestamp(1234567890);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp_ms":1234567890,"tallies":[{"name":"failures","value":2}]}"#
        );
    }

    #[test]
    fn test_deserialize_without_timestamp() {
        let json = r#"{"tallies":[{"name":"a","value":1}]}"#;
        let snapshot: StatsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.timestamp_ms, None);
        assert_eq!(snapshot.get("a"), Some(1));
    }
}
