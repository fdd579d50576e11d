//! Time provider abstraction for real and test-controlled time.
//!
//! The supervisor never talks to a clock directly: every delay goes through
//! [`TimeProvider`], so production code sleeps on the Tokio timer while tests
//! substitute a provider they advance by hand.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during time operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// The time provider has been shut down and is no longer usable.
    #[error("time provider shut down")]
    Shutdown,
}

/// Provider trait for time operations.
///
/// Implementations handle sleeping and current-time queries appropriate for
/// their environment.
#[async_trait(?Send)]
pub trait TimeProvider: Clone {
    /// Sleep for the specified duration.
    async fn sleep(&self, duration: Duration) -> Result<(), TimeError>;

    /// Elapsed time since the provider was created.
    ///
    /// Used for ordering and timestamps, never for wall-clock dates.
    fn now(&self) -> Duration;
}

/// Real time provider using Tokio's time facilities.
#[derive(Debug, Clone)]
pub struct TokioTimeProvider {
    /// Start time for calculating elapsed duration
    start_time: std::time::Instant,
}

impl TokioTimeProvider {
    /// Create a new Tokio time provider.
    pub fn new() -> Self {
        Self {
            start_time: std::time::Instant::now(),
        }
    }
}

impl Default for TokioTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl TimeProvider for TokioTimeProvider {
    async fn sleep(&self, duration: Duration) -> Result<(), TimeError> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    fn now(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tokio_time_provider_sleeps_and_advances() {
        let time = TokioTimeProvider::new();

        let before = time.now();
        let result = time.sleep(Duration::from_millis(1)).await;
        assert!(result.is_ok());

        let after = time.now();
        assert!(after >= before + Duration::from_millis(1));
    }

    #[test]
    fn tokio_time_provider_clone_shares_origin() {
        let time = TokioTimeProvider::new();
        let cloned = time.clone();

        // Both views measure from the same creation instant.
        let a = time.now();
        let b = cloned.now();
        assert!(b >= a || a - b < Duration::from_millis(1));
    }
}
