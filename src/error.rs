//! Error type shared by the stores and the update service.
//!
//! Only conditions that reach the caller are errors. A lost optimistic race
//! is not one of them: it travels as
//! [`VersionedWrite::Conflict`](crate::store::VersionedWrite::Conflict) and
//! never leaves the retry loop.
//!
//! # Example
//!
//! ```rust
//! use contesa::error::{Result, StoreError};
//! use contesa::record::RecordId;
//!
//! fn lookup(found: bool) -> Result<u64> {
//!     if found {
//!         Ok(1)
//!     } else {
//!         Err(StoreError::NotFound(RecordId::new(1)))
//!     }
//! }
//!
//! assert!(lookup(false).unwrap_err().is_not_found());
//! ```

use crate::record::RecordId;
use thiserror::Error;

/// Errors surfaced by the stores and propagated unchanged by the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The identity has no record. Never retried.
    #[error("record {0} not found")]
    NotFound(RecordId),

    /// Connectivity or availability failure of either store.
    ///
    /// Never retried by the service; infrastructure retry belongs to the caller.
    #[error("store unavailable: {0}")]
    Transient(String),
}

impl StoreError {
    /// Builds a [`StoreError::Transient`] from any message.
    pub fn transient(reason: impl Into<String>) -> Self {
        StoreError::Transient(reason.into())
    }

    /// Returns `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Returns `true` for [`StoreError::Transient`].
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

/// Result type for store and service operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            StoreError::NotFound(RecordId::new(4)).to_string(),
            "record 4 not found"
        );
        assert_eq!(
            StoreError::transient("connection reset").to_string(),
            "store unavailable: connection reset"
        );
    }

    #[test]
    fn test_predicates() {
        assert!(StoreError::NotFound(RecordId::new(1)).is_not_found());
        assert!(!StoreError::NotFound(RecordId::new(1)).is_transient());
        assert!(StoreError::transient("x").is_transient());
    }
}
