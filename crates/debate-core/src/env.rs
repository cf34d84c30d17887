//! Environment abstraction for deterministic testing.
//!
//! Decouples client logic from the clock. Production code uses [`SystemEnv`];
//! simulations substitute a virtual clock so reconnect delays elapse
//! instantly and reproducibly.

use std::time::Duration;

/// Abstract environment providing time and async sleep.
///
/// # Invariants
///
/// - `now()` never goes backwards
pub trait Environment: Clone + Send + Sync + 'static {
    /// The instant type used by this environment.
    ///
    /// Production uses `std::time::Instant`; simulations use a virtual clock.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code sleeps. State machines receive `now` as a parameter.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// Production environment backed by the system clock and tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn system_env_sleep_waits() {
        let env = SystemEnv::new();

        let start = env.now();
        env.sleep(Duration::from_millis(20)).await;
        let elapsed = env.now() - start;

        assert!(elapsed >= Duration::from_millis(20), "sleep should wait at least 20ms");
    }
}
