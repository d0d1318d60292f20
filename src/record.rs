//! The contended record and its identity.
//!
//! A [`CounterRecord`] is the unit every strategy fights over: an immutable
//! [`RecordId`], the counter `value`, and a `revision` token that the store
//! bumps by exactly one on every successful write.

use std::fmt::{self, Display};

/// Opaque identity of a counter record.
///
/// # Examples
///
/// ```rust
/// use contesa::record::RecordId;
///
/// let id = RecordId::new(1);
/// assert_eq!(id.get(), 1);
/// assert_eq!(id.to_string(), "1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RecordId(u64);

impl RecordId {
    /// Wraps a raw identity.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identity.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for RecordId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A counter with an identity and an optimistic revision token.
///
/// Records are created by the harness with `value == 0` and `revision == 0`
/// and are only ever mutated through the store operations the
/// [`CounterService`](crate::service::CounterService) drives.
///
/// # Examples
///
/// ```rust
/// use contesa::record::{CounterRecord, RecordId};
///
/// let record = CounterRecord::new(RecordId::new(7))
///     .with_title("hot post")
///     .with_code("P-7");
///
/// assert_eq!(record.value, 0);
/// assert_eq!(record.revision, 0);
/// assert_eq!(record.code.as_deref(), Some("P-7"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CounterRecord {
    /// Immutable identity.
    pub id: RecordId,
    /// Human readable label; no strategy looks at it.
    pub title: String,
    /// Non-unique, non-indexed lookup key used by the unindexed update path.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub code: Option<String>,
    /// The counted quantity.
    pub value: u64,
    /// Conflict-detection token, bumped by exactly one per successful write.
    pub revision: u64,
}

impl CounterRecord {
    /// Creates a fresh record with `value == 0` and `revision == 0`.
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            title: String::new(),
            code: None,
            value: 0,
            revision: 0,
        }
    }

    /// Sets the title, returning `self` for chaining.
    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }

    /// Sets the unindexed lookup code, returning `self` for chaining.
    pub fn with_code(self, code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..self
        }
    }

    /// Returns a copy carrying `value + 1`, keeping the revision that was read.
    ///
    /// Saturates instead of wrapping; `value` never decreases.
    pub fn incremented(&self) -> Self {
        Self {
            value: self.value.saturating_add(1),
            ..self.clone()
        }
    }

    /// Returns `true` if the record's code equals `code`.
    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}

impl Display for CounterRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} value={} rev={}", self.id, self.value, self.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_starts_at_zero() {
        let record = CounterRecord::new(RecordId::new(1));
        assert_eq!(record.value, 0);
        assert_eq!(record.revision, 0);
        assert!(record.title.is_empty());
        assert!(record.code.is_none());
    }

    #[test]
    fn test_incremented_keeps_revision() {
        let record = CounterRecord {
            value: 41,
            revision: 9,
            ..CounterRecord::new(RecordId::new(3))
        };
        let next = record.incremented();
        assert_eq!(next.value, 42);
        assert_eq!(next.revision, 9);
        assert_eq!(next.id, record.id);
    }

    #[test]
    fn test_incremented_saturates() {
        let record = CounterRecord {
            value: u64::MAX,
            ..CounterRecord::new(RecordId::new(3))
        };
        assert_eq!(record.incremented().value, u64::MAX);
    }

    #[test]
    fn test_has_code() {
        let record = CounterRecord::new(RecordId::new(1)).with_code("abc");
        assert!(record.has_code("abc"));
        assert!(!record.has_code("abd"));
        assert!(!CounterRecord::new(RecordId::new(2)).has_code("abc"));
    }

    #[test]
    fn test_display() {
        let record = CounterRecord {
            value: 5,
            revision: 5,
            ..CounterRecord::new(RecordId::new(12))
        };
        assert_eq!(record.to_string(), "#12 value=5 rev=5");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_record() {
        let record = CounterRecord::new(RecordId::new(1)).with_title("t");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"id":1,"title":"t","value":0,"revision":0}"#);
    }
}
