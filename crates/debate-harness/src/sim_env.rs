//! Virtual-time environments.
//!
//! [`SimEnv`] defers to tokio's clock, which tests pause and auto-advance.
//! [`SimInstant`] is a plain offset for synchronous simulations that advance
//! time by hand.

use std::{
    ops::{Add, Sub},
    time::Duration,
};

use debate_core::Environment;

/// Environment on tokio's (pausable) clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimEnv;

impl SimEnv {
    /// Create a simulation environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SimEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Instant on a manual clock: time since the simulation started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Simulation start.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Time since simulation start.
    #[must_use]
    pub const fn elapsed(self) -> Duration {
        self.0
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs))
    }
}
