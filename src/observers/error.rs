//! Error type shared by the observers.

use thiserror::Error;

/// Errors raised while rendering reports or tallies.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// Serialization failure in the JSON observer.
    #[cfg(feature = "json")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The system clock is set before the Unix epoch.
    #[error("clock error: {0}")]
    Clock(#[from] std::time::SystemTimeError),
}

/// Result type for observer operations.
pub type Result<T> = std::result::Result<T, ObserverError>;

/// Milliseconds since the Unix epoch.
#[cfg(feature = "json")]
pub(crate) fn now_ms() -> Result<u64> {
    let elapsed = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH)?;
    Ok(elapsed.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    #[test]
    fn test_clock_error_display() {
        let err = UNIX_EPOCH
            .duration_since(UNIX_EPOCH + Duration::from_secs(1))
            .unwrap_err();
        let err = ObserverError::from(err);
        assert!(err.to_string().starts_with("clock error:"));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_now_ms_is_after_epoch() {
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        assert!(now_ms().unwrap() >= before);
    }
}
