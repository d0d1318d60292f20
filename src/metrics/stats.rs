//! Per-strategy tallies kept by the update service.

use std::fmt::{self, Debug};

use crate::metrics::{Observable, Tally};

/// What the update service has done since creation (or the last reset).
///
/// The optimistic give-up tally is the observable trace of increments the
/// optimistic strategy silently dropped: under known contention a test can
/// compare it against `expected - observed`.
///
/// # Examples
///
/// ```rust
/// use contesa::metrics::{Observable, StrategyStats};
///
/// let stats = StrategyStats::new();
/// stats.optimistic_give_ups.incr();
///
/// let names: Vec<&str> = stats.observables().iter().map(|o| o.name()).collect();
/// assert!(names.contains(&"optimistic_give_ups"));
/// assert_eq!(stats.optimistic_give_ups.value(), 1);
/// ```
pub struct StrategyStats {
    /// Exclusive increments committed.
    pub exclusive_applied: Tally,
    /// Optimistic increments that landed.
    pub optimistic_applied: Tally,
    /// Versioned writes rejected because the revision moved.
    pub optimistic_conflicts: Tally,
    /// Optimistic calls that exhausted their attempts and dropped the increment.
    pub optimistic_give_ups: Tally,
    /// Fast-store increments.
    pub fast_applied: Tally,
    /// Rows touched by unindexed updates.
    pub unindexed_rows: Tally,
    /// Calls that returned an error to the caller.
    pub failures: Tally,
}

impl StrategyStats {
    /// Creates a zeroed set of tallies.
    pub const fn new() -> Self {
        Self {
            exclusive_applied: Tally::new().with_name("exclusive_applied"),
            optimistic_applied: Tally::new().with_name("optimistic_applied"),
            optimistic_conflicts: Tally::new().with_name("optimistic_conflicts"),
            optimistic_give_ups: Tally::new().with_name("optimistic_give_ups"),
            fast_applied: Tally::new().with_name("fast_applied"),
            unindexed_rows: Tally::new().with_name("unindexed_rows"),
            failures: Tally::new().with_name("failures"),
        }
    }

    /// All tallies, in a fixed order, for observers.
    pub fn observables(&self) -> [&dyn Observable; 7] {
        [
            &self.exclusive_applied,
            &self.optimistic_applied,
            &self.optimistic_conflicts,
            &self.optimistic_give_ups,
            &self.fast_applied,
            &self.unindexed_rows,
            &self.failures,
        ]
    }

    /// Zeroes every tally.
    pub fn reset(&self) {
        for tally in self.observables() {
            tally.value_and_reset();
        }
    }
}

impl Default for StrategyStats {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for StrategyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for tally in self.observables() {
            map.entry(&tally.name(), &tally.value());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let stats = StrategyStats::new();
        let mut names: Vec<&str> = stats.observables().iter().map(|o| o.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn test_reset() {
        let stats = StrategyStats::new();
        stats.exclusive_applied.add(3);
        stats.failures.incr();
        stats.reset();
        assert!(stats.observables().iter().all(|o| o.value() == 0));
    }

    #[test]
    fn test_debug() {
        let stats = StrategyStats::new();
        stats.fast_applied.add(2);
        let debug_str = format!("{:?}", stats);
        assert!(debug_str.contains("\"fast_applied\": 2"));
    }
}
